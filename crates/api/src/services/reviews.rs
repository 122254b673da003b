use chrono::Utc;
use sqlx::SqlitePool;

use super::error::ServiceError;
use super::guards;
use crate::routes::models::{
    CourseRef, NamedRef, PendingReview, ReviewEntry, ReviewerInfo, UserRef,
};

/// Records a review and folds it into the denormalized running averages of
/// the course and its instructor. The average update is a single atomic
/// UPDATE per row; rounding to two decimals happens on every update, so the
/// stored value drifts from the exact mean as ratings accumulate.
pub async fn submit_review(
    pool: &SqlitePool,
    reviewer_id: i64,
    course_id: i64,
    rating: i64,
    comment: Option<String>,
) -> Result<(), ServiceError> {
    if !(1..=5).contains(&rating) {
        return Err(ServiceError::validation("Rating must be between 1 and 5"));
    }

    guards::require_enrollment(
        pool,
        reviewer_id,
        course_id,
        "You must be enrolled in this course to leave a review",
    )
    .await?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM reviews WHERE reviewer_id = ? AND course_id = ?")
            .bind(reviewer_id)
            .bind(course_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(ServiceError::conflict(
            "You have already reviewed this course",
        ));
    }

    // The enrollment guard passed, so the course row exists.
    let (instructor_id,): (i64,) =
        sqlx::query_as("SELECT instructor_id FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_one(pool)
            .await?;

    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    let insert = sqlx::query(
        "INSERT INTO reviews (reviewer_id, course_id, instructor_id, rating, comment, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(reviewer_id)
    .bind(course_id)
    .bind(instructor_id)
    .bind(rating)
    .bind(&comment)
    .bind(&now)
    .execute(&mut *tx)
    .await;
    if let Err(err) = insert {
        if is_unique_violation(&err) {
            return Err(ServiceError::conflict(
                "You have already reviewed this course",
            ));
        }
        return Err(err.into());
    }

    sqlx::query(
        "UPDATE courses
         SET rating = ROUND((rating * total_ratings + ?) / (total_ratings + 1.0), 2),
             total_ratings = total_ratings + 1
         WHERE id = ?",
    )
    .bind(rating as f64)
    .bind(course_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE instructors
         SET rating = ROUND((rating * total_ratings + ?) / (total_ratings + 1.0), 2),
             total_ratings = total_ratings + 1
         WHERE id = ?",
    )
    .bind(rating as f64)
    .bind(instructor_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(reviewer_id, course_id, rating, "review recorded");
    Ok(())
}

#[derive(sqlx::FromRow)]
struct InstructorReviewRow {
    id: i64,
    rating: i64,
    comment: Option<String>,
    created_at: String,
    reviewer_name: String,
    reviewer_image: Option<String>,
    course_id: Option<i64>,
    course_title: Option<String>,
}

/// Approved reviews for an approved instructor, newest first.
pub async fn instructor_reviews(
    pool: &SqlitePool,
    instructor_id: i64,
    skip: i64,
    limit: i64,
) -> Result<Vec<ReviewEntry>, ServiceError> {
    let known: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM instructors WHERE id = ? AND is_approved = 1")
            .bind(instructor_id)
            .fetch_optional(pool)
            .await?;
    if known.is_none() {
        return Err(ServiceError::not_found("Instructor not found"));
    }

    let rows = sqlx::query_as::<_, InstructorReviewRow>(
        "SELECT r.id, r.rating, r.comment, r.created_at,
                u.full_name AS reviewer_name, u.profile_image AS reviewer_image,
                c.id AS course_id, c.title AS course_title
         FROM reviews r
         JOIN users u ON u.id = r.reviewer_id
         LEFT JOIN courses c ON c.id = r.course_id
         WHERE r.instructor_id = ? AND r.is_approved = 1
         ORDER BY r.created_at DESC
         LIMIT ? OFFSET ?",
    )
    .bind(instructor_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReviewEntry {
            id: row.id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            reviewer: ReviewerInfo {
                full_name: row.reviewer_name,
                profile_image: row.reviewer_image,
            },
            course: match (row.course_id, row.course_title) {
                (Some(id), Some(title)) => Some(CourseRef { id, title }),
                _ => None,
            },
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct PendingReviewRow {
    id: i64,
    rating: i64,
    comment: Option<String>,
    created_at: String,
    reviewer_id: i64,
    reviewer_name: String,
    course_id: Option<i64>,
    course_title: Option<String>,
    review_instructor_id: Option<i64>,
    instructor_name: Option<String>,
}

/// Reviews awaiting moderation, newest first.
pub async fn pending_reviews(pool: &SqlitePool) -> Result<Vec<PendingReview>, ServiceError> {
    let rows = sqlx::query_as::<_, PendingReviewRow>(
        "SELECT r.id, r.rating, r.comment, r.created_at,
                ru.id AS reviewer_id, ru.full_name AS reviewer_name,
                c.id AS course_id, c.title AS course_title,
                i.id AS review_instructor_id, iu.full_name AS instructor_name
         FROM reviews r
         JOIN users ru ON ru.id = r.reviewer_id
         LEFT JOIN courses c ON c.id = r.course_id
         LEFT JOIN instructors i ON i.id = r.instructor_id
         LEFT JOIN users iu ON iu.id = i.user_id
         WHERE r.is_approved = 0
         ORDER BY r.created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PendingReview {
            id: row.id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            reviewer: UserRef {
                id: row.reviewer_id,
                full_name: row.reviewer_name,
            },
            course: match (row.course_id, row.course_title) {
                (Some(id), Some(title)) => Some(CourseRef { id, title }),
                _ => None,
            },
            instructor: match (row.review_instructor_id, row.instructor_name) {
                (Some(id), Some(name)) => Some(NamedRef { id, name }),
                _ => None,
            },
        })
        .collect())
}

/// Marks a review approved. Aggregates are never recomputed here.
pub async fn approve_review(pool: &SqlitePool, review_id: i64) -> Result<(), ServiceError> {
    let result = sqlx::query("UPDATE reviews SET is_approved = 1 WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Review not found"));
    }
    Ok(())
}

/// Removes a review. The denormalized averages are left as they are.
pub async fn delete_review(pool: &SqlitePool, review_id: i64) -> Result<(), ServiceError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(review_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Review not found"));
    }
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.message().contains("UNIQUE constraint failed"))
        .unwrap_or(false)
}
