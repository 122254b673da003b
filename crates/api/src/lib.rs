mod docs;
mod error;
mod patch;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use error::{ApiError, ErrorResponse};
pub use patch::Patch;
pub use state::{ApiSettings, AppState};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth routes
        .route("/api/auth/send-otp", post(routes::auth::send_otp))
        .route("/api/auth/verify-otp", post(routes::auth::verify_otp))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/profile", put(routes::auth::update_profile))
        // Course routes
        .route("/api/courses", get(routes::courses::list_courses))
        .route("/api/courses", post(routes::courses::create_course))
        .route("/api/courses/my-courses", get(routes::courses::my_courses))
        .route(
            "/api/courses/categories/list",
            get(routes::courses::list_categories),
        )
        .route("/api/courses/:course_id", get(routes::courses::get_course))
        .route(
            "/api/courses/:course_id",
            put(routes::courses::update_course),
        )
        .route(
            "/api/courses/:course_id/upload-thumbnail",
            post(routes::courses::upload_thumbnail),
        )
        .route(
            "/api/courses/:course_id/lessons",
            post(routes::courses::create_lesson),
        )
        .route(
            "/api/courses/:course_id/lessons",
            get(routes::courses::list_lessons),
        )
        .route("/api/courses/:course_id/enroll", post(routes::courses::enroll))
        .route(
            "/api/courses/:course_id/reviews",
            post(routes::courses::submit_review),
        )
        // Instructor routes
        .route("/api/instructors", get(routes::instructors::list_instructors))
        .route("/api/instructors/apply", post(routes::instructors::apply))
        .route(
            "/api/instructors/my/profile",
            get(routes::instructors::my_profile),
        )
        .route(
            "/api/instructors/my/profile",
            put(routes::instructors::update_my_profile),
        )
        .route(
            "/api/instructors/specializations/list",
            get(routes::instructors::list_specializations),
        )
        .route(
            "/api/instructors/:instructor_id",
            get(routes::instructors::get_instructor),
        )
        .route(
            "/api/instructors/:instructor_id/reviews",
            get(routes::instructors::instructor_reviews),
        )
        // Payment routes
        .route(
            "/api/payments/create-payment",
            post(routes::payments::create_payment),
        )
        .route(
            "/api/payments/verify-payment/:payment_id",
            post(routes::payments::verify_payment),
        )
        .route("/api/payments/my-payments", get(routes::payments::my_payments))
        .route(
            "/api/payments/payment/:payment_id",
            get(routes::payments::get_payment),
        )
        // Assistant routes
        .route("/api/ai/chat", post(routes::assistant::chat))
        .route("/api/ai/generate-quiz", post(routes::assistant::generate_quiz))
        .route("/api/ai/study-plan", post(routes::assistant::study_plan))
        .route(
            "/api/ai/recommendations",
            get(routes::assistant::recommendations),
        )
        .route(
            "/api/ai/my-interactions",
            get(routes::assistant::my_interactions),
        )
        // Admin routes
        .route("/api/admin/users", get(routes::admin::list_users))
        .route(
            "/api/admin/users/:user_id/activate",
            put(routes::admin::activate_user),
        )
        .route(
            "/api/admin/users/:user_id/deactivate",
            put(routes::admin::deactivate_user),
        )
        .route("/api/admin/instructors", get(routes::admin::list_instructors))
        .route(
            "/api/admin/instructors/:instructor_id/approve",
            put(routes::admin::approve_instructor),
        )
        .route(
            "/api/admin/instructors/:instructor_id/reject",
            put(routes::admin::reject_instructor),
        )
        .route("/api/admin/courses", get(routes::admin::list_courses))
        .route(
            "/api/admin/courses/:course_id/publish",
            put(routes::admin::publish_course),
        )
        .route(
            "/api/admin/courses/:course_id/unpublish",
            put(routes::admin::unpublish_course),
        )
        .route(
            "/api/admin/courses/:course_id/feature",
            put(routes::admin::feature_course),
        )
        .route(
            "/api/admin/courses/:course_id/unfeature",
            put(routes::admin::unfeature_course),
        )
        .route("/api/admin/reviews/pending", get(routes::admin::pending_reviews))
        .route(
            "/api/admin/reviews/:review_id/approve",
            put(routes::admin::approve_review),
        )
        .route(
            "/api/admin/reviews/:review_id",
            delete(routes::admin::delete_review),
        )
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
