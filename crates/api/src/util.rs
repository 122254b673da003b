use axum::http::{header, HeaderMap};

use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header. The scheme is
/// matched case-insensitively.
pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::unauthorized("Invalid authorization scheme"));
    }

    let token = parts.next().map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Missing bearer token"));
    }

    Ok(token.to_string())
}

/// Normalizes skip/limit query parameters into a usable window.
pub fn page_window(
    skip: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> (i64, i64) {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
    (skip, limit)
}
