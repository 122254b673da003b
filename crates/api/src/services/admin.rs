//! Moderation and publishing operations. Every caller has already passed
//! [`super::guards::require_admin`].

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use campus_auth::User;

use super::error::ServiceError;
use crate::routes::models::{
    AdminCourseEntry, AdminCoursesQuery, AdminInstructorEntry, AdminInstructorsQuery,
    AdminUsersQuery, UserResponse,
};
use crate::util::page_window;

/// Accounts matching the role/activity filters, newest first.
pub async fn list_users(
    pool: &SqlitePool,
    query: &AdminUsersQuery,
) -> Result<Vec<UserResponse>, ServiceError> {
    let (skip, limit) = page_window(query.skip, query.limit, 20, 100);

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, email, phone, full_name, role, is_active, is_verified, city, district,
                profile_image, created_at
         FROM users WHERE 1 = 1",
    );
    if let Some(role) = &query.role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(is_active) = query.is_active {
        builder.push(" AND is_active = ").push_bind(is_active);
    }
    builder
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let users: Vec<User> = builder.build_query_as().fetch_all(pool).await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

/// Flips an account's active flag. Admin accounts cannot be deactivated.
pub async fn set_user_active(
    pool: &SqlitePool,
    user_id: i64,
    active: bool,
) -> Result<&'static str, ServiceError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let (role,) = row.ok_or_else(|| ServiceError::not_found("User not found"))?;
    if !active && role == "admin" {
        return Err(ServiceError::forbidden("Cannot deactivate admin user"));
    }

    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(&now)
        .bind(user_id)
        .execute(pool)
        .await?;

    tracing::info!(user_id, active, "account activity changed");
    Ok(if active {
        "User activated successfully"
    } else {
        "User deactivated"
    })
}

/// Instructor applications and profiles, optionally filtered by approval
/// state, newest first.
pub async fn list_instructors(
    pool: &SqlitePool,
    query: &AdminInstructorsQuery,
) -> Result<Vec<AdminInstructorEntry>, ServiceError> {
    let (skip, limit) = page_window(query.skip, query.limit, 20, 100);

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT i.id, i.user_id, u.full_name, u.email, i.bio, i.specialization,
                i.experience_years, i.is_approved, i.rating, i.total_students,
                (SELECT COUNT(*) FROM courses c WHERE c.instructor_id = i.id) AS total_courses,
                i.created_at
         FROM instructors i
         JOIN users u ON u.id = i.user_id
         WHERE 1 = 1",
    );
    if let Some(is_approved) = query.is_approved {
        builder.push(" AND i.is_approved = ").push_bind(is_approved);
    }
    builder
        .push(" ORDER BY i.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let entries: Vec<AdminInstructorEntry> = builder.build_query_as().fetch_all(pool).await?;
    Ok(entries)
}

pub async fn approve_instructor(
    pool: &SqlitePool,
    instructor_id: i64,
) -> Result<(), ServiceError> {
    let result = sqlx::query("UPDATE instructors SET is_approved = 1 WHERE id = ?")
        .bind(instructor_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Instructor not found"));
    }
    tracing::info!(instructor_id, "instructor approved");
    Ok(())
}

/// Removes the instructor profile and reverts the account to a student
/// role. Profiles with existing courses cannot be removed; the schema
/// would cascade the delete across their catalog otherwise.
pub async fn reject_instructor(pool: &SqlitePool, instructor_id: i64) -> Result<(), ServiceError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM instructors WHERE id = ?")
        .bind(instructor_id)
        .fetch_optional(pool)
        .await?;
    let (user_id,) = row.ok_or_else(|| ServiceError::not_found("Instructor not found"))?;

    let (course_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM courses WHERE instructor_id = ?")
            .bind(instructor_id)
            .fetch_one(pool)
            .await?;
    if course_count > 0 {
        return Err(ServiceError::conflict(
            "Cannot reject an instructor who has courses",
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM instructors WHERE id = ?")
        .bind(instructor_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE users SET role = 'student', updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(instructor_id, user_id, "instructor application rejected");
    Ok(())
}

/// Every course, optionally filtered by publication state, newest first.
pub async fn list_courses(
    pool: &SqlitePool,
    query: &AdminCoursesQuery,
) -> Result<Vec<AdminCourseEntry>, ServiceError> {
    let (skip, limit) = page_window(query.skip, query.limit, 20, 100);

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT c.id, c.title, c.category, c.price, c.is_published, c.is_featured,
                c.enrollment_count, c.rating, c.total_ratings, c.created_at,
                u.full_name AS instructor_name
         FROM courses c
         JOIN instructors i ON i.id = c.instructor_id
         JOIN users u ON u.id = i.user_id
         WHERE 1 = 1",
    );
    if let Some(is_published) = query.is_published {
        builder.push(" AND c.is_published = ").push_bind(is_published);
    }
    builder
        .push(" ORDER BY c.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let entries: Vec<AdminCourseEntry> = builder.build_query_as().fetch_all(pool).await?;
    Ok(entries)
}

pub async fn set_course_published(
    pool: &SqlitePool,
    course_id: i64,
    published: bool,
) -> Result<&'static str, ServiceError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE courses SET is_published = ?, updated_at = ? WHERE id = ?")
        .bind(published)
        .bind(&now)
        .bind(course_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Course not found"));
    }
    tracing::info!(course_id, published, "course publication changed");
    Ok(if published {
        "Course published successfully"
    } else {
        "Course unpublished"
    })
}

pub async fn set_course_featured(
    pool: &SqlitePool,
    course_id: i64,
    featured: bool,
) -> Result<&'static str, ServiceError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE courses SET is_featured = ?, updated_at = ? WHERE id = ?")
        .bind(featured)
        .bind(&now)
        .bind(course_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found("Course not found"));
    }
    Ok(if featured {
        "Course featured successfully"
    } else {
        "Course unfeatured"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils;

    fn users_query() -> AdminUsersQuery {
        AdminUsersQuery {
            role: None,
            is_active: None,
            skip: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn user_listing_filters_by_role_and_activity() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        test_utils::seed_user(&pool, "s@example.com", "+905550000001").await;
        let banned = test_utils::seed_user(&pool, "b@example.com", "+905550000002").await;
        test_utils::seed_user_with_role(&pool, "a@example.com", "+905550000003", "admin").await;
        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(banned)
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(list_users(&pool, &users_query()).await.unwrap().len(), 3);

        let mut query = users_query();
        query.role = Some("student".to_string());
        assert_eq!(list_users(&pool, &query).await.unwrap().len(), 2);

        let mut query = users_query();
        query.is_active = Some(false);
        let inactive = list_users(&pool, &query).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, banned);
    }

    #[tokio::test]
    async fn admin_accounts_cannot_be_deactivated() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let admin =
            test_utils::seed_user_with_role(&pool, "a@example.com", "+905550000001", "admin").await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;

        let err = set_user_active(&pool, admin, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let message = set_user_active(&pool, student, false).await.unwrap();
        assert_eq!(message, "User deactivated");
        let row = test_utils::user_by_id(&pool, student).await;
        assert!(!row.is_active);

        let message = set_user_active(&pool, student, true).await.unwrap();
        assert_eq!(message, "User activated successfully");

        let err = set_user_active(&pool, 9999, true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn instructor_listing_filters_by_approval_and_counts_courses() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let a = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let b = test_utils::seed_user(&pool, "b@example.com", "+905550000002").await;
        let approved = test_utils::seed_instructor(&pool, a, true).await;
        test_utils::seed_instructor(&pool, b, false).await;
        test_utils::seed_course(&pool, approved, Default::default()).await;
        test_utils::seed_course(
            &pool,
            approved,
            test_utils::CourseSeed {
                title: "Draft",
                is_published: false,
                ..Default::default()
            },
        )
        .await;

        let query = AdminInstructorsQuery {
            is_approved: None,
            skip: None,
            limit: None,
        };
        assert_eq!(list_instructors(&pool, &query).await.unwrap().len(), 2);

        let query = AdminInstructorsQuery {
            is_approved: Some(false),
            skip: None,
            limit: None,
        };
        let pending = list_instructors(&pool, &query).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].is_approved);

        let query = AdminInstructorsQuery {
            is_approved: Some(true),
            skip: None,
            limit: None,
        };
        let listed = list_instructors(&pool, &query).await.unwrap();
        assert_eq!(listed[0].total_courses, 2);
        assert_eq!(listed[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn approval_flips_the_flag() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, user, false).await;

        approve_instructor(&pool, instructor_id).await.unwrap();
        let (approved,): (bool,) =
            sqlx::query_as("SELECT is_approved FROM instructors WHERE id = ?")
                .bind(instructor_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(approved);

        let err = approve_instructor(&pool, 9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejection_removes_profile_and_reverts_role() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user_with_role(
            &pool,
            "a@example.com",
            "+905550000001",
            "instructor",
        )
        .await;
        let instructor_id = test_utils::seed_instructor(&pool, user, false).await;

        reject_instructor(&pool, instructor_id).await.unwrap();

        let gone: Option<(i64,)> = sqlx::query_as("SELECT id FROM instructors WHERE id = ?")
            .bind(instructor_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(gone.is_none());
        let row = test_utils::user_by_id(&pool, user).await;
        assert_eq!(row.role, "student");
    }

    #[tokio::test]
    async fn rejection_with_courses_is_a_conflict() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user_with_role(
            &pool,
            "a@example.com",
            "+905550000001",
            "instructor",
        )
        .await;
        let instructor_id = test_utils::seed_instructor(&pool, user, true).await;
        test_utils::seed_course(&pool, instructor_id, Default::default()).await;

        let err = reject_instructor(&pool, instructor_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let still_there: Option<(i64,)> = sqlx::query_as("SELECT id FROM instructors WHERE id = ?")
            .bind(instructor_id)
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(still_there.is_some());
        let row = test_utils::user_by_id(&pool, user).await;
        assert_eq!(row.role, "instructor");
    }

    #[tokio::test]
    async fn course_listing_filters_by_publication() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, user, true).await;
        test_utils::seed_course(&pool, instructor_id, Default::default()).await;
        test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                title: "Draft",
                is_published: false,
                ..Default::default()
            },
        )
        .await;

        let query = AdminCoursesQuery {
            is_published: None,
            skip: None,
            limit: None,
        };
        let all = list_courses(&pool, &query).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].instructor_name, "User a@example.com");

        let query = AdminCoursesQuery {
            is_published: Some(false),
            skip: None,
            limit: None,
        };
        let drafts = list_courses(&pool, &query).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Draft");
    }

    #[tokio::test]
    async fn publication_and_feature_toggles() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, user, true).await;
        let course_id = test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                is_published: false,
                ..Default::default()
            },
        )
        .await;

        let message = set_course_published(&pool, course_id, true).await.unwrap();
        assert_eq!(message, "Course published successfully");
        let message = set_course_featured(&pool, course_id, true).await.unwrap();
        assert_eq!(message, "Course featured successfully");

        let (published, featured): (bool, bool) =
            sqlx::query_as("SELECT is_published, is_featured FROM courses WHERE id = ?")
                .bind(course_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(published);
        assert!(featured);

        assert_eq!(
            set_course_published(&pool, course_id, false).await.unwrap(),
            "Course unpublished"
        );
        assert_eq!(
            set_course_featured(&pool, course_id, false).await.unwrap(),
            "Course unfeatured"
        );

        let err = set_course_published(&pool, 9999, true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
