use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore};
use serde::Serialize;
use sqlx::{FromRow, Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use campus_config::AuthConfig;

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
    otp_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email or phone already registered")]
    UserExists,
    #[error("phone number not verified")]
    PhoneNotVerified,
    #[error("invalid or expired OTP")]
    InvalidOtp,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is deactivated")]
    AccountDeactivated,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "instructor" => UserRole::Instructor,
            "admin" => UserRole::Admin,
            _ => UserRole::Student,
        }
    }
}

impl ToString for UserRole {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub phone: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub city: Option<String>,
    pub district: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.role() == UserRole::Admin
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued OTP challenge. Delivery over SMS is not wired up;
/// callers decide whether the code is echoed back to the client.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub phone: String,
    pub password: String,
    pub full_name: String,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let session_ttl = Duration::seconds(config.session_ttl_seconds as i64);
        let otp_ttl = Duration::seconds(config.otp_ttl_seconds as i64);

        Self {
            pool,
            session_ttl,
            otp_ttl,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn request_otp(&self, phone: &str) -> Result<OtpChallenge, AuthError> {
        let code = generate_otp_code();
        let now = Utc::now();
        let expires_at = now + self.otp_ttl;

        sqlx::query(
            "INSERT INTO otp_verifications (phone, otp_code, is_verified, expires_at, created_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(phone)
        .bind(&code)
        .bind(expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(phone, "issued otp challenge");
        Ok(OtpChallenge { code, expires_at })
    }

    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<(), AuthError> {
        let row = sqlx::query(
            "SELECT id, expires_at FROM otp_verifications
             WHERE phone = ? AND otp_code = ? AND is_verified = 0
             ORDER BY id DESC LIMIT 1",
        )
        .bind(phone)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidOtp);
        };

        let expires_at: String = row.try_get("expires_at")?;
        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidOtp)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            return Err(AuthError::InvalidOtp);
        }

        let id: i64 = row.try_get("id")?;
        sqlx::query("UPDATE otp_verifications SET is_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn register(&self, account: NewAccount) -> Result<(User, AuthSession), AuthError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ? OR phone = ?")
            .bind(&account.email)
            .bind(&account.phone)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        let verified = sqlx::query(
            "SELECT id FROM otp_verifications WHERE phone = ? AND is_verified = 1 ORDER BY id DESC LIMIT 1",
        )
        .bind(&account.phone)
        .fetch_optional(&mut *tx)
        .await?;

        if verified.is_none() {
            return Err(AuthError::PhoneNotVerified);
        }

        let now = Utc::now().to_rfc3339();
        let password_hash = self.hash_password(&account.password)?;

        let result = sqlx::query(
            "INSERT INTO users (email, phone, password_hash, full_name, role, is_active, is_verified, city, district, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'student', 1, 1, ?, ?, ?, ?)",
        )
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&password_hash)
        .bind(&account.full_name)
        .bind(account.city.as_deref())
        .bind(account.district.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::UserExists
            } else {
                AuthError::Database(err)
            }
        })?;

        let user_id = result.last_insert_rowid();
        tx.commit().await?;

        let user = self.fetch_user(user_id).await?;
        let session = self.issue_session(user_id).await?;

        info!(user_id, "registered new account");
        Ok((user, session))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT id, password_hash, is_active FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored: String = row.try_get("password_hash")?;
        let stored_hash = PasswordHash::new(&stored)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let is_active: bool = row.try_get("is_active")?;
        if !is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let user_id: i64 = row.try_get("id")?;
        let user = self.fetch_user(user_id).await?;
        let session = self.issue_session(user_id).await?;

        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self.fetch_user(user_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        };

        Ok((user, session))
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.fetch_user(user_id).await
    }

    /// Creates or promotes an admin account. Existing users (matched by
    /// email) are updated in place, so the operation is safe to re-run.
    pub async fn ensure_admin(
        &self,
        email: &str,
        phone: &str,
        password: &str,
        full_name: &str,
    ) -> Result<i64, AuthError> {
        let password_hash = self.hash_password(password)?;
        let now = Utc::now().to_rfc3339();

        let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let user_id = match existing {
            Some(row) => {
                let id: i64 = row.try_get("id")?;
                sqlx::query(
                    "UPDATE users
                     SET phone = ?, password_hash = ?, full_name = ?, role = 'admin',
                         is_active = 1, is_verified = 1, updated_at = ?
                     WHERE id = ?",
                )
                .bind(phone)
                .bind(&password_hash)
                .bind(full_name)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO users (email, phone, password_hash, full_name, role, is_active, is_verified, created_at, updated_at)
                     VALUES (?, ?, ?, ?, 'admin', 1, 1, ?, ?)",
                )
                .bind(email)
                .bind(phone)
                .bind(&password_hash)
                .bind(full_name)
                .bind(&now)
                .bind(&now)
                .execute(&self.pool)
                .await?;
                result.last_insert_rowid()
            }
        };

        info!(user_id, "ensured admin account");
        Ok(user_id)
    }

    async fn fetch_user(&self, id: i64) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, phone, full_name, role, is_active, is_verified, city, district, profile_image, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = self.generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&token)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn generate_session_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn generate_otp_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.message().contains("UNIQUE constraint failed"))
        .unwrap_or(false)
}
