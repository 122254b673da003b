use axum::{
    extract::{Path as UrlPath, Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    routes::models::{
        InstructorApplyRequest, InstructorApplyResponse, InstructorListQuery, InstructorProfile,
        InstructorSummary, ReviewEntry, ReviewListQuery, UpdateInstructorProfileRequest,
    },
    services,
    util::{page_window, require_bearer},
    ApiError, AppState,
};

#[utoipa::path(
    get,
    path = "/api/instructors",
    tag = "Instructors",
    params(InstructorListQuery),
    responses(
        (status = 200, description = "Approved instructors matching the filters", body = [InstructorSummary])
    )
)]
pub async fn list_instructors(
    State(state): State<AppState>,
    Query(query): Query<InstructorListQuery>,
) -> Result<Json<Vec<InstructorSummary>>, ApiError> {
    let instructors = services::instructors::list_instructors(state.pool(), &query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(instructors))
}

#[utoipa::path(
    post,
    path = "/api/instructors/apply",
    tag = "Instructors",
    security(("bearerAuth" = [])),
    request_body = InstructorApplyRequest,
    responses(
        (status = 200, description = "Application submitted", body = InstructorApplyResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 409, description = "Application already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn apply(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InstructorApplyRequest>,
) -> Result<Json<InstructorApplyResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let response = services::instructors::apply(state.pool(), &user, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/instructors/my/profile",
    tag = "Instructors",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Caller's instructor profile", body = InstructorProfile),
        (status = 404, description = "No instructor profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InstructorProfile>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let profile = services::instructors::my_profile(state.pool(), &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/instructors/my/profile",
    tag = "Instructors",
    security(("bearerAuth" = [])),
    request_body = UpdateInstructorProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = InstructorProfile),
        (status = 400, description = "Invalid profile payload", body = crate::error::ErrorResponse),
        (status = 404, description = "No instructor profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateInstructorProfileRequest>,
) -> Result<Json<InstructorProfile>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let profile = services::instructors::update_profile(state.pool(), &user, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/instructors/specializations/list",
    tag = "Instructors",
    responses(
        (status = 200, description = "Distinct specializations of approved instructors", body = [String])
    )
)]
pub async fn list_specializations(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let specializations = services::instructors::list_specializations(state.pool())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(specializations))
}

#[utoipa::path(
    get,
    path = "/api/instructors/{instructor_id}",
    tag = "Instructors",
    params(("instructor_id" = i64, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Public instructor profile", body = InstructorProfile),
        (status = 404, description = "Instructor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_instructor(
    State(state): State<AppState>,
    UrlPath(instructor_id): UrlPath<i64>,
) -> Result<Json<InstructorProfile>, ApiError> {
    let profile = services::instructors::get_instructor(state.pool(), instructor_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/instructors/{instructor_id}/reviews",
    tag = "Instructors",
    params(
        ("instructor_id" = i64, Path, description = "Instructor id"),
        ReviewListQuery
    ),
    responses(
        (status = 200, description = "Approved reviews for the instructor's courses", body = [ReviewEntry]),
        (status = 404, description = "Instructor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn instructor_reviews(
    State(state): State<AppState>,
    UrlPath(instructor_id): UrlPath<i64>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<Vec<ReviewEntry>>, ApiError> {
    let (skip, limit) = page_window(query.skip, query.limit, 10, 50);
    let reviews = services::reviews::instructor_reviews(state.pool(), instructor_id, skip, limit)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(reviews))
}
