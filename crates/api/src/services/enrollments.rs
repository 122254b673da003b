use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::error::ServiceError;
use super::guards;
use crate::routes::models::{EnrolledCourse, EnrollmentInfo, InstructorCard};

/// Inserts the enrollment and bumps `courses.enrollment_count` and
/// `instructors.total_students` inside the caller's transaction. Both the
/// free-enrollment path and the payment-confirmation path go through here.
/// Returns `None` when the enrollment already existed; counters are then
/// left untouched.
pub(crate) async fn record_enrollment(
    tx: &mut Transaction<'_, Sqlite>,
    student_id: i64,
    course_id: i64,
    instructor_id: i64,
) -> Result<Option<i64>, ServiceError> {
    let now = Utc::now().to_rfc3339();
    let inserted = sqlx::query(
        "INSERT INTO enrollments (student_id, course_id, enrolled_at) VALUES (?, ?, ?)
         ON CONFLICT (student_id, course_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(&now)
    .execute(&mut **tx)
    .await?;

    if inserted.rows_affected() == 0 {
        return Ok(None);
    }
    let enrollment_id = inserted.last_insert_rowid();

    sqlx::query("UPDATE courses SET enrollment_count = enrollment_count + 1 WHERE id = ?")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("UPDATE instructors SET total_students = total_students + 1 WHERE id = ?")
        .bind(instructor_id)
        .execute(&mut **tx)
        .await?;

    Ok(Some(enrollment_id))
}

/// Free enrollment into a published course.
pub async fn enroll_direct(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<(), ServiceError> {
    let course: Option<(i64,)> =
        sqlx::query_as("SELECT instructor_id FROM courses WHERE id = ? AND is_published = 1")
            .bind(course_id)
            .fetch_optional(pool)
            .await?;
    let (instructor_id,) = course.ok_or_else(|| ServiceError::not_found("Course not found"))?;

    if guards::find_enrollment(pool, student_id, course_id)
        .await?
        .is_some()
    {
        return Err(ServiceError::conflict(
            "You are already enrolled in this course",
        ));
    }

    let mut tx = pool.begin().await?;
    let inserted = record_enrollment(&mut tx, student_id, course_id, instructor_id).await?;
    if inserted.is_none() {
        tx.rollback().await?;
        return Err(ServiceError::conflict(
            "You are already enrolled in this course",
        ));
    }
    tx.commit().await?;

    tracing::info!(student_id, course_id, "student enrolled");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct EnrolledCourseRow {
    id: i64,
    title: String,
    description: String,
    thumbnail: Option<String>,
    category: String,
    level: String,
    duration_hours: i64,
    instructor_id: i64,
    instructor_name: String,
    instructor_bio: Option<String>,
    instructor_rating: f64,
    instructor_total_students: i64,
    instructor_experience_years: i64,
    enrolled_at: String,
    progress_percentage: f64,
    completed_at: Option<String>,
}

/// The caller's enrollments joined with course and instructor summaries.
pub async fn my_courses(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<EnrolledCourse>, ServiceError> {
    let rows = sqlx::query_as::<_, EnrolledCourseRow>(
        "SELECT c.id, c.title, c.description, c.thumbnail, c.category, c.level, c.duration_hours,
                i.id AS instructor_id, u.full_name AS instructor_name, i.bio AS instructor_bio,
                i.rating AS instructor_rating, i.total_students AS instructor_total_students,
                i.experience_years AS instructor_experience_years,
                e.enrolled_at, e.progress_percentage, e.completed_at
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         JOIN instructors i ON i.id = c.instructor_id
         JOIN users u ON u.id = i.user_id
         WHERE e.student_id = ?
         ORDER BY e.enrolled_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| EnrolledCourse {
            id: row.id,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            category: row.category,
            level: row.level,
            duration_hours: row.duration_hours,
            instructor: InstructorCard {
                id: row.instructor_id,
                name: row.instructor_name,
                bio: row.instructor_bio,
                rating: row.instructor_rating,
                total_students: row.instructor_total_students,
                experience_years: row.instructor_experience_years,
            },
            enrollment: EnrollmentInfo {
                enrolled_at: row.enrolled_at,
                progress_percentage: row.progress_percentage,
                completed_at: row.completed_at,
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils;

    async fn published_course(pool: &SqlitePool, enrollment_count: i64) -> (i64, i64) {
        let owner = test_utils::seed_user(pool, "i@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(pool, owner, true).await;
        let course_id = test_utils::seed_course(
            pool,
            instructor_id,
            test_utils::CourseSeed {
                enrollment_count,
                ..Default::default()
            },
        )
        .await;
        (instructor_id, course_id)
    }

    #[tokio::test]
    async fn direct_enroll_adds_one_row_and_bumps_counters() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (instructor_id, course_id) = published_course(&pool, 5).await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;

        enroll_direct(&pool, student, course_id).await.unwrap();

        let (count, _, _) = test_utils::course_counters(&pool, course_id).await;
        assert_eq!(count, 6);
        assert_eq!(test_utils::enrollment_count(&pool, course_id).await, 1);
        let (students, _, _) = test_utils::instructor_counters(&pool, instructor_id).await;
        assert_eq!(students, 1);
    }

    #[tokio::test]
    async fn duplicate_enrollment_is_a_conflict() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (_, course_id) = published_course(&pool, 0).await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;

        enroll_direct(&pool, student, course_id).await.unwrap();
        let err = enroll_direct(&pool, student, course_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let (count, _, _) = test_utils::course_counters(&pool, course_id).await;
        assert_eq!(count, 1);
        assert_eq!(test_utils::enrollment_count(&pool, course_id).await, 1);
    }

    #[tokio::test]
    async fn unpublished_course_is_not_found() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let owner = test_utils::seed_user(&pool, "i@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, owner, true).await;
        let course_id = test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                is_published: false,
                ..Default::default()
            },
        )
        .await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;

        let err = enroll_direct(&pool, student, course_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn my_courses_lists_enrollment_progress() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (_, course_id) = published_course(&pool, 0).await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;
        test_utils::seed_enrollment(&pool, student, course_id).await;

        let courses = my_courses(&pool, student).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, course_id);
        assert_eq!(courses[0].enrollment.progress_percentage, 0.0);
        assert_eq!(courses[0].instructor.name, "User i@example.com");
    }

    #[tokio::test]
    async fn my_courses_empty_for_unenrolled_student() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000001").await;

        let courses = my_courses(&pool, student).await.unwrap();
        assert!(courses.is_empty());
    }
}
