use std::path::Path;

use axum::{
    extract::{Multipart, Path as UrlPath, Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    routes::models::{
        CourseDetail, CourseListQuery, CourseSummary, CreateCourseRequest, CreateLessonRequest,
        EnrolledCourse, LessonResponse, MessageResponse, SubmitReviewRequest, ThumbnailResponse,
        UpdateCourseRequest,
    },
    services,
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "Courses",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Published courses matching the filters", body = [CourseSummary])
    )
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let courses = services::courses::list_courses(state.pool(), &query)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(courses))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "Courses",
    security(("bearerAuth" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 200, description = "Course created in unpublished state", body = CourseSummary),
        (status = 400, description = "Invalid course payload", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not an approved instructor", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Json<CourseSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let instructor = services::guards::require_approved_instructor(state.pool(), user.id).await?;

    let course = services::courses::create_course(state.pool(), instructor, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(course))
}

#[utoipa::path(
    get,
    path = "/api/courses/my-courses",
    tag = "Courses",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Courses the caller is enrolled in", body = [EnrolledCourse]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_courses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EnrolledCourse>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let courses = services::enrollments::my_courses(state.pool(), user.id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/categories/list",
    tag = "Courses",
    responses(
        (status = 200, description = "Distinct categories of published courses", body = [String])
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = services::courses::list_categories(state.pool())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    tag = "Courses",
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course detail with preview lessons", body = CourseDetail),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = services::courses::get_course(state.pool(), course_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseSummary),
        (status = 400, description = "Invalid course payload", body = crate::error::ErrorResponse),
        (status = 404, description = "Course not owned by the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_course(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<CourseSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let instructor = services::guards::require_approved_instructor(state.pool(), user.id).await?;

    let course = services::courses::update_course(state.pool(), instructor, course_id, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(course))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/upload-thumbnail",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or invalid image", body = crate::error::ErrorResponse),
        (status = 404, description = "Course not owned by the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let instructor = services::guards::require_approved_instructor(state.pool(), user.id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?
    {
        if field.name() == Some("file") {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let extension = field
                .file_name()
                .and_then(|name| name.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or_else(|| "jpg".to_string());
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?;
            upload = Some((content_type, extension, data));
            break;
        }
    }

    let Some((content_type, extension, data)) = upload else {
        return Err(ApiError::bad_request("Missing file field"));
    };

    if !content_type.starts_with("image/") {
        return Err(ApiError::bad_request("Uploaded file must be an image"));
    }

    let settings = state.settings();
    if data.len() as u64 > settings.max_image_bytes {
        return Err(ApiError::bad_request("Image exceeds the maximum allowed size"));
    }

    let filename = format!("course_{course_id}.{extension}");
    let thumbnail_url = format!(
        "/{}/course_thumbnails/{filename}",
        settings.uploads_dir.trim_matches('/')
    );

    // Ownership is enforced by the update before anything touches the disk.
    services::courses::set_thumbnail(state.pool(), instructor, course_id, &thumbnail_url)
        .await
        .map_err(ApiError::from)?;

    let dir = Path::new(&settings.uploads_dir).join("course_thumbnails");
    tokio::fs::create_dir_all(&dir).await.map_err(storage_error)?;
    tokio::fs::write(dir.join(&filename), &data)
        .await
        .map_err(storage_error)?;

    Ok(Json(ThumbnailResponse {
        message: "Thumbnail uploaded successfully".to_string(),
        thumbnail_url,
    }))
}

fn storage_error(err: std::io::Error) -> ApiError {
    tracing::error!("thumbnail write failed: {}", err);
    ApiError::internal_server_error("Failed to store thumbnail")
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/lessons",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = CreateLessonRequest,
    responses(
        (status = 200, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Invalid lesson payload", body = crate::error::ErrorResponse),
        (status = 404, description = "Course not owned by the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_lesson(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<Json<LessonResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let instructor = services::guards::require_approved_instructor(state.pool(), user.id).await?;

    let lesson = services::lessons::create_lesson(state.pool(), instructor, course_id, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(lesson))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lessons visible to the caller", body = [LessonResponse]),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_lessons(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let lessons = services::lessons::list_lessons(state.pool(), &user, course_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(lessons))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/enroll",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollment created", body = MessageResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already enrolled", body = crate::error::ErrorResponse)
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    services::enrollments::enroll_direct(state.pool(), user.id, course_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Successfully enrolled in course")))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/reviews",
    tag = "Courses",
    security(("bearerAuth" = [])),
    params(("course_id" = i64, Path, description = "Course id")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review created", body = MessageResponse),
        (status = 400, description = "Invalid rating", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not enrolled", body = crate::error::ErrorResponse),
        (status = 409, description = "Course already reviewed", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_review(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<i64>,
    headers: HeaderMap,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    services::reviews::submit_review(
        state.pool(),
        user.id,
        course_id,
        payload.rating,
        payload.comment,
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(MessageResponse::new("Review created successfully")))
}
