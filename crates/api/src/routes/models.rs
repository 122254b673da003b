//! Request and response bodies shared across the route modules.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use campus_auth::User;

use crate::patch::Patch;

// Auth

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpSendRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpVerifyRequest {
    pub phone: String,
    pub otp_code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub phone: String,
    pub password: String,
    pub full_name: String,
    pub city: Option<String>,
    pub district: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub city: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub district: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub profile_image: Patch<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub phone: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub city: Option<String>,
    pub district: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            is_verified: user.is_verified,
            city: user.city,
            district: user.district,
            profile_image: user.profile_image,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpSendResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Catalog

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstructorCard {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub rating: f64,
    pub total_students: i64,
    pub experience_years: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub level: String,
    pub language: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub duration_hours: i64,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub is_online: bool,
    pub is_published: bool,
    pub is_featured: bool,
    pub enrollment_count: i64,
    pub rating: f64,
    pub total_ratings: i64,
    pub created_at: String,
    pub updated_at: String,
    pub instructor: InstructorCard,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub preview_lessons: Vec<LessonResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub is_online: Option<bool>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub level: Option<String>,
    pub language: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub duration_hours: i64,
    pub location: Option<String>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub short_description: Patch<String>,
    pub category: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub subcategory: Patch<String>,
    pub level: Option<String>,
    pub language: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub discount_price: Patch<f64>,
    pub duration_hours: Option<i64>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub location: Patch<String>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct LessonResponse {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: i64,
    pub order_index: i64,
    pub is_preview: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: i64,
    pub order_index: i64,
    pub is_preview: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThumbnailResponse {
    pub message: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentInfo {
    pub enrolled_at: String,
    pub progress_percentage: f64,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrolledCourse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub category: String,
    pub level: String,
    pub duration_hours: i64,
    pub instructor: InstructorCard,
    pub enrollment: EnrollmentInfo,
}

// Instructors

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorUserInfo {
    pub id: i64,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorSummary {
    pub id: i64,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: i64,
    pub rating: f64,
    pub total_ratings: i64,
    pub total_students: i64,
    pub total_courses: i64,
    pub user: InstructorUserInfo,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct InstructorCourseCard {
    pub id: i64,
    pub title: String,
    pub short_description: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub duration_hours: i64,
    pub level: String,
    pub category: String,
    pub thumbnail: Option<String>,
    pub rating: f64,
    pub enrollment_count: i64,
    pub is_online: bool,
    pub location: Option<String>,
    pub is_published: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorProfile {
    pub id: i64,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: i64,
    pub certification: Option<String>,
    pub is_approved: bool,
    pub rating: f64,
    pub total_ratings: i64,
    pub total_students: i64,
    pub created_at: String,
    pub total_courses: i64,
    pub user: InstructorUserInfo,
    pub courses: Vec<InstructorCourseCard>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstructorListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub specialization: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub min_experience: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InstructorApplyRequest {
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<i64>,
    pub certification: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstructorApplyResponse {
    pub message: String,
    pub instructor_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInstructorProfileRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub bio: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub specialization: Patch<String>,
    pub experience_years: Option<i64>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub certification: Patch<String>,
}

// Reviews

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewerInfo {
    pub full_name: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewEntry {
    pub id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub reviewer: ReviewerInfo,
    pub course: Option<CourseRef>,
}

// Payments

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub course_id: i64,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedPaymentResponse {
    pub payment_id: i64,
    pub status: String,
    pub payment_url: String,
    pub token: String,
    pub transaction_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentConfirmation {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentCourseInfo {
    pub id: i64,
    pub title: String,
    pub thumbnail: Option<String>,
    pub instructor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub payment_date: String,
    pub course: PaymentCourseInfo,
}

// Assistant

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    pub message: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatReply {
    pub response: String,
    pub model_used: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizRequest {
    pub course_id: i64,
    pub topic: String,
    pub difficulty: Option<String>,
    pub question_count: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<campus_assistant::QuizQuestion>,
    pub model_used: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudyPlanRequest {
    pub course_id: i64,
    pub available_hours_per_week: Option<u32>,
    pub target_completion_weeks: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudyPlanResponse {
    #[schema(value_type = Object)]
    pub plan: campus_assistant::StudyPlan,
    pub recommendations: Vec<String>,
    pub model_used: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseRecommendation {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub level: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub rating: f64,
    pub enrollment_count: i64,
    pub thumbnail: Option<String>,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStats {
    pub completed_courses: i64,
    pub in_progress_courses: i64,
    pub favorite_categories: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<CourseRecommendation>,
    pub message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_stats: Option<UserStats>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InteractionsQuery {
    #[serde(rename = "type")]
    pub interaction_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InteractionEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub model_used: String,
    pub created_at: String,
    #[schema(value_type = Object)]
    pub input: serde_json::Value,
    #[schema(value_type = Object)]
    pub output: serde_json::Value,
}

// Admin

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUsersQuery {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminInstructorsQuery {
    pub is_approved: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminCoursesQuery {
    pub is_published: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AdminInstructorEntry {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: i64,
    pub is_approved: bool,
    pub rating: f64,
    pub total_students: i64,
    pub total_courses: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AdminCourseEntry {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub is_published: bool,
    pub is_featured: bool,
    pub enrollment_count: i64,
    pub rating: f64,
    pub total_ratings: i64,
    pub created_at: String,
    pub instructor_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRef {
    pub id: i64,
    pub full_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingReview {
    pub id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: String,
    pub reviewer: UserRef,
    pub course: Option<CourseRef>,
    pub instructor: Option<NamedRef>,
}
