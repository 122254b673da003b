//! Eligibility checks shared by the route services.

use sqlx::SqlitePool;

use campus_auth::User;

use super::error::ServiceError;

/// Instructor identity proven by [`require_approved_instructor`].
#[derive(Debug, Clone, Copy)]
pub struct ApprovedInstructor {
    pub id: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentRecord {
    pub id: i64,
    pub progress_percentage: f64,
}

/// Requires an approved instructor profile for the user.
pub async fn require_approved_instructor(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<ApprovedInstructor, ServiceError> {
    let row: Option<(i64, bool)> =
        sqlx::query_as("SELECT id, is_approved FROM instructors WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match row {
        None => Err(ServiceError::forbidden(
            "You need to be an approved instructor to perform this action",
        )),
        Some((_, false)) => Err(ServiceError::forbidden(
            "Your instructor account is not approved yet",
        )),
        Some((id, true)) => Ok(ApprovedInstructor { id }),
    }
}

pub async fn find_enrollment(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<Option<EnrollmentRecord>, ServiceError> {
    let record = sqlx::query_as::<_, EnrollmentRecord>(
        "SELECT id, progress_percentage FROM enrollments WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Requires an enrollment; `denial` is the forbidden message shown when
/// the caller is not enrolled.
pub async fn require_enrollment(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
    denial: &str,
) -> Result<EnrollmentRecord, ServiceError> {
    find_enrollment(pool, student_id, course_id)
        .await?
        .ok_or_else(|| ServiceError::forbidden(denial))
}

pub fn require_admin(user: &User) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Admin access required"))
    }
}
