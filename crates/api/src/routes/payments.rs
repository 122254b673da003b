use axum::{
    extract::{Path as UrlPath, State},
    http::HeaderMap,
    Json,
};

use crate::{
    routes::models::{
        CreatePaymentRequest, CreatedPaymentResponse, PaymentConfirmation, PaymentResponse,
    },
    services,
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/payments/create-payment",
    tag = "Payments",
    security(("bearerAuth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CreatedPaymentResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already enrolled or payment pending", body = crate::error::ErrorResponse),
        (status = 502, description = "Payment provider unreachable", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<CreatedPaymentResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let payment_method = payload.payment_method.as_deref().unwrap_or("iyzico");
    let response = services::payments::create_payment(
        state.pool(),
        state.billing(),
        &user,
        payload.course_id,
        payment_method,
        &state.settings().currency,
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify-payment/{payment_id}",
    tag = "Payments",
    security(("bearerAuth" = [])),
    params(("payment_id" = i64, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Verification outcome", body = PaymentConfirmation),
        (status = 404, description = "Payment not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Payment provider unreachable", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    UrlPath(payment_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<PaymentConfirmation>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let confirmation =
        services::payments::confirm_payment(state.pool(), state.billing(), user.id, payment_id)
            .await
            .map_err(ApiError::from)?;

    Ok(Json(confirmation))
}

#[utoipa::path(
    get,
    path = "/api/payments/my-payments",
    tag = "Payments",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Caller's payments, newest first", body = [PaymentResponse]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let payments = services::payments::my_payments(state.pool(), user.id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payments/payment/{payment_id}",
    tag = "Payments",
    security(("bearerAuth" = [])),
    params(("payment_id" = i64, Path, description = "Payment id")),
    responses(
        (status = 200, description = "One payment owned by the caller", body = PaymentResponse),
        (status = 404, description = "Payment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    UrlPath(payment_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<PaymentResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let payment = services::payments::payment_by_id(state.pool(), user.id, payment_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(payment))
}
