use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use crate::{
    routes::models::{
        ChatMessageRequest, ChatReply, InteractionEntry, InteractionsQuery, QuizRequest,
        QuizResponse, RecommendationsResponse, StudyPlanRequest, StudyPlanResponse,
    },
    services,
    util::require_bearer,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/ai/chat",
    tag = "Assistant",
    security(("bearerAuth" = [])),
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Tutor reply", body = ChatReply),
        (status = 502, description = "AI provider unreachable", body = crate::error::ErrorResponse),
        (status = 503, description = "AI services unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatMessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let reply = services::assistant::chat(state.pool(), state.assistant(), &user, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(reply))
}

#[utoipa::path(
    post,
    path = "/api/ai/generate-quiz",
    tag = "Assistant",
    security(("bearerAuth" = [])),
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Generated quiz questions", body = QuizResponse),
        (status = 400, description = "Invalid request or malformed model output", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not enrolled in the course", body = crate::error::ErrorResponse),
        (status = 503, description = "AI services unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn generate_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let quiz = services::assistant::generate_quiz(state.pool(), state.assistant(), &user, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(quiz))
}

#[utoipa::path(
    post,
    path = "/api/ai/study-plan",
    tag = "Assistant",
    security(("bearerAuth" = [])),
    request_body = StudyPlanRequest,
    responses(
        (status = 200, description = "Deterministic study plan", body = StudyPlanResponse),
        (status = 400, description = "Invalid planning bounds", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not enrolled in the course", body = crate::error::ErrorResponse)
    )
)]
pub async fn study_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StudyPlanRequest>,
) -> Result<Json<StudyPlanResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let plan = services::assistant::study_plan(state.pool(), &user, payload)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(plan))
}

#[utoipa::path(
    get,
    path = "/api/ai/recommendations",
    tag = "Assistant",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Course recommendations for the caller", body = RecommendationsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let response = services::assistant::recommendations(state.pool(), &user)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/ai/my-interactions",
    tag = "Assistant",
    security(("bearerAuth" = [])),
    params(InteractionsQuery),
    responses(
        (status = 200, description = "Latest assistant interactions", body = [InteractionEntry]),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<InteractionsQuery>,
) -> Result<Json<Vec<InteractionEntry>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let interactions = services::assistant::my_interactions(
        state.pool(),
        user.id,
        query.interaction_type.as_deref(),
    )
    .await
    .map_err(ApiError::from)?;

    Ok(Json(interactions))
}
