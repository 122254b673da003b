//! Moderation and publishing console. Every handler authenticates the
//! caller and requires the `admin` role before touching the service layer.

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::HeaderMap,
    Json,
};

use campus_auth::User;

use crate::{
    routes::models::{
        AdminCourseEntry, AdminCoursesQuery, AdminInstructorEntry, AdminInstructorsQuery,
        AdminUsersQuery, MessageResponse, PendingReview, UserResponse,
    },
    services,
    util::require_bearer,
    ApiError, AppState,
};

async fn require_admin_caller(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = require_bearer(headers)?;
    let (user, _) = state.authenticate(&token).await?;
    services::guards::require_admin(&user)?;
    Ok(user)
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(AdminUsersQuery),
    responses(
        (status = 200, description = "Users matching the filters", body = [UserResponse]),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let users = services::admin::list_users(state.pool(), &query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(users))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/activate",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User activated", body = MessageResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn activate_user(
    State(state): State<AppState>,
    UrlPath(user_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_user_active(state.pool(), user_id, true)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/deactivate",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = MessageResponse),
        (status = 403, description = "Admin accounts cannot be deactivated", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    UrlPath(user_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_user_active(state.pool(), user_id, false)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    get,
    path = "/api/admin/instructors",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(AdminInstructorsQuery),
    responses(
        (status = 200, description = "Instructor applications and profiles", body = [AdminInstructorEntry]),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_instructors(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminInstructorsQuery>,
) -> Result<Json<Vec<AdminInstructorEntry>>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let instructors = services::admin::list_instructors(state.pool(), &query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(instructors))
}

#[utoipa::path(
    put,
    path = "/api/admin/instructors/{instructor_id}/approve",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("instructor_id" = i64, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Instructor approved", body = MessageResponse),
        (status = 404, description = "Instructor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_instructor(
    State(state): State<AppState>,
    UrlPath(instructor_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    services::admin::approve_instructor(state.pool(), instructor_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Instructor approved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/admin/instructors/{instructor_id}/reject",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("instructor_id" = i64, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Application rejected and role reverted", body = MessageResponse),
        (status = 404, description = "Instructor not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Instructor still owns courses", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_instructor(
    State(state): State<AppState>,
    UrlPath(instructor_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    services::admin::reject_instructor(state.pool(), instructor_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Instructor rejected")))
}

#[utoipa::path(
    get,
    path = "/api/admin/courses",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(AdminCoursesQuery),
    responses(
        (status = 200, description = "Courses regardless of publication state", body = [AdminCourseEntry]),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_courses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminCoursesQuery>,
) -> Result<Json<Vec<AdminCourseEntry>>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let courses = services::admin::list_courses(state.pool(), &query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(courses))
}

#[utoipa::path(
    put,
    path = "/api/admin/courses/{course_id}/publish",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course published", body = MessageResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn publish_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_course_published(state.pool(), course_id, true)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/admin/courses/{course_id}/unpublish",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course unpublished", body = MessageResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn unpublish_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_course_published(state.pool(), course_id, false)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/admin/courses/{course_id}/feature",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course featured", body = MessageResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn feature_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_course_featured(state.pool(), course_id, true)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    put,
    path = "/api/admin/courses/{course_id}/unfeature",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course unfeatured", body = MessageResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn unfeature_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let message = services::admin::set_course_featured(state.pool(), course_id, false)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new(message)))
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews/pending",
    tag = "Admin",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Reviews awaiting moderation", body = [PendingReview]),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn pending_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PendingReview>>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    let reviews = services::reviews::pending_reviews(state.pool())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(reviews))
}

#[utoipa::path(
    put,
    path = "/api/admin/reviews/{review_id}/approve",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("review_id" = i64, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review approved", body = MessageResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_review(
    State(state): State<AppState>,
    UrlPath(review_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    services::reviews::approve_review(state.pool(), review_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Review approved successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/admin/reviews/{review_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("review_id" = i64, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    UrlPath(review_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin_caller(&state, &headers).await?;

    services::reviews::delete_review(state.pool(), review_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Review deleted successfully")))
}
