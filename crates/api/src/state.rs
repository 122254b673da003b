use std::sync::Arc;

use sqlx::SqlitePool;

use campus_assistant::Assistant;
use campus_auth::{AuthSession, Authenticator, User};
use campus_billing::PaymentGateway;
use campus_config::AppConfig;

use crate::error::ApiError;

/// Request-time settings lifted out of the full configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub expose_otp_codes: bool,
    pub currency: String,
    pub uploads_dir: String,
    pub max_image_bytes: u64,
}

impl ApiSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            expose_otp_codes: config.auth.expose_otp_codes,
            currency: config.billing.currency.clone(),
            uploads_dir: config.uploads.dir.clone(),
            max_image_bytes: config.uploads.max_image_bytes,
        }
    }
}

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    authenticator: Authenticator,
    billing: Arc<dyn PaymentGateway>,
    assistant: Arc<Assistant>,
    settings: ApiSettings,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        authenticator: Authenticator,
        billing: Arc<dyn PaymentGateway>,
        assistant: Arc<Assistant>,
        settings: ApiSettings,
    ) -> Self {
        Self {
            pool,
            authenticator,
            billing,
            assistant,
            settings,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn billing(&self) -> &dyn PaymentGateway {
        self.billing.as_ref()
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Resolves a bearer token into the authenticated user and session.
    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession), ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }
}
