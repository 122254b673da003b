use chrono::Utc;
use sqlx::SqlitePool;

use campus_auth::User;

use super::error::ServiceError;
use super::guards::{find_enrollment, ApprovedInstructor};
use crate::routes::models::{CreateLessonRequest, LessonResponse};

const LESSON_SELECT: &str = "SELECT id, course_id, title, description, video_url, duration_minutes, order_index, \
     is_preview, notes, created_at FROM lessons";

/// Adds a lesson to a course the instructor owns.
pub async fn create_lesson(
    pool: &SqlitePool,
    instructor: ApprovedInstructor,
    course_id: i64,
    req: CreateLessonRequest,
) -> Result<LessonResponse, ServiceError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ServiceError::validation("Lesson title must not be empty"));
    }

    let owned: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM courses WHERE id = ? AND instructor_id = ?")
            .bind(course_id)
            .bind(instructor.id)
            .fetch_optional(pool)
            .await?;
    if owned.is_none() {
        return Err(ServiceError::not_found(
            "Course not found or you don't have permission to edit it",
        ));
    }

    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO lessons (course_id, title, description, video_url, duration_minutes,
                              order_index, is_preview, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(&title)
    .bind(&req.description)
    .bind(&req.video_url)
    .bind(req.duration_minutes)
    .bind(req.order_index)
    .bind(req.is_preview.unwrap_or(false))
    .bind(&req.notes)
    .bind(&now)
    .execute(pool)
    .await?;

    let sql = format!("{LESSON_SELECT} WHERE id = ?");
    let lesson = sqlx::query_as::<_, LessonResponse>(&sql)
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;
    tracing::info!(lesson_id = lesson.id, course_id, "lesson created");
    Ok(lesson)
}

/// Lists lessons in order. Enrolled students and the owning instructor
/// see every lesson, everyone else only preview rows.
pub async fn list_lessons(
    pool: &SqlitePool,
    user: &User,
    course_id: i64,
) -> Result<Vec<LessonResponse>, ServiceError> {
    let course: Option<(i64, bool)> =
        sqlx::query_as("SELECT instructor_id, is_published FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(pool)
            .await?;
    let (instructor_id, is_published) =
        course.ok_or_else(|| ServiceError::not_found("Course not found"))?;

    let owner: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM instructors WHERE id = ? AND user_id = ?")
            .bind(instructor_id)
            .bind(user.id)
            .fetch_optional(pool)
            .await?;
    let is_owner = owner.is_some();

    if !is_published && !is_owner {
        return Err(ServiceError::not_found("Course not found"));
    }

    let full_access = is_owner || find_enrollment(pool, user.id, course_id).await?.is_some();

    let sql = if full_access {
        format!("{LESSON_SELECT} WHERE course_id = ? ORDER BY order_index ASC")
    } else {
        format!("{LESSON_SELECT} WHERE course_id = ? AND is_preview = 1 ORDER BY order_index ASC")
    };
    let lessons = sqlx::query_as::<_, LessonResponse>(&sql)
        .bind(course_id)
        .fetch_all(pool)
        .await?;
    Ok(lessons)
}
