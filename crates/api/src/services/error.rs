use campus_assistant::AssistantError;
use campus_auth::AuthError;
use campus_billing::BillingError;

use crate::error::ApiError;

/// Failure taxonomy of the service layer. Route handlers convert these
/// into `ApiError` responses.
#[derive(Debug)]
pub enum ServiceError {
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    Validation(String),
    BadGateway(String),
    Unavailable(String),
    Database(sqlx::Error),
    Auth(AuthError),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::BadGateway(msg) => ApiError::bad_gateway(msg),
            ServiceError::Unavailable(msg) => ApiError::service_unavailable(msg),
            ServiceError::Database(db_err) => {
                tracing::error!("database error: {}", db_err);
                ApiError::internal_server_error("Database operation failed")
            }
            ServiceError::Auth(auth_err) => ApiError::from(auth_err),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<BillingError> for ServiceError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Rejected(msg) => {
                Self::Validation(format!("Payment was declined: {msg}"))
            }
            BillingError::Http(http_err) => {
                tracing::warn!("payment gateway request failed: {}", http_err);
                Self::BadGateway("Payment provider is unreachable".to_string())
            }
            BillingError::InvalidResponse(msg) => {
                tracing::warn!("payment gateway returned invalid response: {}", msg);
                Self::BadGateway("Payment provider returned an invalid response".to_string())
            }
        }
    }
}

impl From<AssistantError> for ServiceError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::NotConfigured => {
                Self::Unavailable("AI services are not configured".to_string())
            }
            AssistantError::AllProvidersFailed(detail) => {
                tracing::warn!("all assistant providers failed: {}", detail);
                Self::Unavailable("AI services are currently unavailable".to_string())
            }
            AssistantError::Http(http_err) => {
                tracing::warn!("assistant request failed: {}", http_err);
                Self::BadGateway("AI provider is unreachable".to_string())
            }
            AssistantError::InvalidResponse(msg) => {
                Self::Validation(format!("Assistant returned malformed output: {msg}"))
            }
        }
    }
}
