use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use campus_auth::AuthError;

/// Error returned from route handlers. Carries the HTTP status and a
/// message that is safe to show to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("internal error: {:#}", err);
        ApiError::internal_server_error("Internal server error")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserExists => {
                ApiError::conflict("User with this email or phone already exists")
            }
            AuthError::PhoneNotVerified => {
                ApiError::bad_request("Phone number not verified. Please verify OTP first.")
            }
            AuthError::InvalidOtp => ApiError::bad_request("Invalid or expired OTP"),
            AuthError::InvalidCredentials => ApiError::unauthorized("Incorrect email or password"),
            AuthError::AccountDeactivated => ApiError::unauthorized("Account is deactivated"),
            AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => ApiError::unauthorized("Invalid or expired session"),
            AuthError::Database(err) => {
                tracing::error!("auth database error: {}", err);
                ApiError::internal_server_error("Database operation failed")
            }
            AuthError::PasswordHash(err) => {
                tracing::error!("password hashing error: {}", err);
                ApiError::internal_server_error("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::from(AuthError::UserExists).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::AccountDeactivated).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::SessionExpired).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidOtp).status,
            StatusCode::BAD_REQUEST
        );
    }
}
