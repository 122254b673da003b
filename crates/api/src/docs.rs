use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::send_otp,
        crate::routes::auth::verify_otp,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::update_profile,
        crate::routes::courses::list_courses,
        crate::routes::courses::create_course,
        crate::routes::courses::my_courses,
        crate::routes::courses::list_categories,
        crate::routes::courses::get_course,
        crate::routes::courses::update_course,
        crate::routes::courses::upload_thumbnail,
        crate::routes::courses::create_lesson,
        crate::routes::courses::list_lessons,
        crate::routes::courses::enroll,
        crate::routes::courses::submit_review,
        crate::routes::instructors::list_instructors,
        crate::routes::instructors::apply,
        crate::routes::instructors::my_profile,
        crate::routes::instructors::update_my_profile,
        crate::routes::instructors::list_specializations,
        crate::routes::instructors::get_instructor,
        crate::routes::instructors::instructor_reviews,
        crate::routes::payments::create_payment,
        crate::routes::payments::verify_payment,
        crate::routes::payments::my_payments,
        crate::routes::payments::get_payment,
        crate::routes::assistant::chat,
        crate::routes::assistant::generate_quiz,
        crate::routes::assistant::study_plan,
        crate::routes::assistant::recommendations,
        crate::routes::assistant::my_interactions,
        crate::routes::admin::list_users,
        crate::routes::admin::activate_user,
        crate::routes::admin::deactivate_user,
        crate::routes::admin::list_instructors,
        crate::routes::admin::approve_instructor,
        crate::routes::admin::reject_instructor,
        crate::routes::admin::list_courses,
        crate::routes::admin::publish_course,
        crate::routes::admin::unpublish_course,
        crate::routes::admin::feature_course,
        crate::routes::admin::unfeature_course,
        crate::routes::admin::pending_reviews,
        crate::routes::admin::approve_review,
        crate::routes::admin::delete_review
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::models::OtpSendRequest,
            crate::routes::models::OtpVerifyRequest,
            crate::routes::models::RegisterRequest,
            crate::routes::models::LoginRequest,
            crate::routes::models::UpdateProfileRequest,
            crate::routes::models::UserResponse,
            crate::routes::models::AuthTokenResponse,
            crate::routes::models::OtpSendResponse,
            crate::routes::models::MessageResponse,
            crate::routes::models::InstructorCard,
            crate::routes::models::CourseSummary,
            crate::routes::models::CourseDetail,
            crate::routes::models::CreateCourseRequest,
            crate::routes::models::UpdateCourseRequest,
            crate::routes::models::LessonResponse,
            crate::routes::models::CreateLessonRequest,
            crate::routes::models::ThumbnailResponse,
            crate::routes::models::EnrollmentInfo,
            crate::routes::models::EnrolledCourse,
            crate::routes::models::InstructorUserInfo,
            crate::routes::models::InstructorSummary,
            crate::routes::models::InstructorCourseCard,
            crate::routes::models::InstructorProfile,
            crate::routes::models::InstructorApplyRequest,
            crate::routes::models::InstructorApplyResponse,
            crate::routes::models::UpdateInstructorProfileRequest,
            crate::routes::models::SubmitReviewRequest,
            crate::routes::models::ReviewerInfo,
            crate::routes::models::CourseRef,
            crate::routes::models::ReviewEntry,
            crate::routes::models::CreatePaymentRequest,
            crate::routes::models::CreatedPaymentResponse,
            crate::routes::models::PaymentConfirmation,
            crate::routes::models::PaymentCourseInfo,
            crate::routes::models::PaymentResponse,
            crate::routes::models::ChatMessageRequest,
            crate::routes::models::ChatReply,
            crate::routes::models::QuizRequest,
            crate::routes::models::QuizResponse,
            crate::routes::models::StudyPlanRequest,
            crate::routes::models::StudyPlanResponse,
            crate::routes::models::CourseRecommendation,
            crate::routes::models::UserStats,
            crate::routes::models::RecommendationsResponse,
            crate::routes::models::InteractionEntry,
            crate::routes::models::AdminInstructorEntry,
            crate::routes::models::AdminCourseEntry,
            crate::routes::models::UserRef,
            crate::routes::models::NamedRef,
            crate::routes::models::PendingReview
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "OTP verification, registration, and session management"),
        (name = "Courses", description = "Catalog browsing, authoring, enrollment, and reviews"),
        (name = "Instructors", description = "Instructor directory and profile management"),
        (name = "Payments", description = "Checkout sessions and payment verification"),
        (name = "Assistant", description = "AI tutor, quizzes, study plans, and recommendations"),
        (name = "Admin", description = "Moderation and publishing console")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Bearer".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
