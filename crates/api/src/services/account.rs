use chrono::Utc;
use sqlx::SqlitePool;

use campus_auth::User;

use super::error::ServiceError;
use crate::routes::models::UpdateProfileRequest;

/// Sparse update of the caller's own profile fields.
pub async fn update_profile(
    pool: &SqlitePool,
    user: &User,
    req: UpdateProfileRequest,
) -> Result<User, ServiceError> {
    let full_name = req.full_name.unwrap_or_else(|| user.full_name.clone());
    if full_name.trim().is_empty() {
        return Err(ServiceError::validation("Full name must not be empty"));
    }
    let city = req.city.resolve(user.city.clone());
    let district = req.district.resolve(user.district.clone());
    let profile_image = req.profile_image.resolve(user.profile_image.clone());
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE users
         SET full_name = ?, city = ?, district = ?, profile_image = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&full_name)
    .bind(&city)
    .bind(&district)
    .bind(&profile_image)
    .bind(&now)
    .bind(user.id)
    .execute(pool)
    .await?;

    let updated = sqlx::query_as::<_, User>(
        "SELECT id, email, phone, full_name, role, is_active, is_verified, city, district,
                profile_image, created_at
         FROM users WHERE id = ?",
    )
    .bind(user.id)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}
