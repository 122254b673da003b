use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use campus_auth::User;

use super::error::ServiceError;
use crate::routes::models::{
    InstructorApplyRequest, InstructorApplyResponse, InstructorCourseCard, InstructorListQuery,
    InstructorProfile, InstructorSummary, InstructorUserInfo, UpdateInstructorProfileRequest,
};
use crate::util::page_window;

const PROFILE_SELECT: &str = "SELECT i.id, i.user_id, i.bio, i.specialization, i.experience_years, i.certification, \
     i.is_approved, i.rating, i.total_ratings, i.total_students, i.created_at, \
     u.full_name, u.email, u.phone, u.city, u.district, u.profile_image \
     FROM instructors i JOIN users u ON u.id = i.user_id";

#[derive(sqlx::FromRow)]
struct InstructorRow {
    id: i64,
    user_id: i64,
    bio: Option<String>,
    specialization: Option<String>,
    experience_years: i64,
    certification: Option<String>,
    is_approved: bool,
    rating: f64,
    total_ratings: i64,
    total_students: i64,
    created_at: String,
    full_name: String,
    email: String,
    phone: String,
    city: Option<String>,
    district: Option<String>,
    profile_image: Option<String>,
}

impl InstructorRow {
    fn into_profile(
        self,
        courses: Vec<InstructorCourseCard>,
        include_contact: bool,
    ) -> InstructorProfile {
        InstructorProfile {
            id: self.id,
            bio: self.bio,
            specialization: self.specialization,
            experience_years: self.experience_years,
            certification: self.certification,
            is_approved: self.is_approved,
            rating: self.rating,
            total_ratings: self.total_ratings,
            total_students: self.total_students,
            created_at: self.created_at,
            total_courses: courses.len() as i64,
            user: InstructorUserInfo {
                id: self.user_id,
                full_name: self.full_name,
                email: include_contact.then_some(self.email),
                phone: include_contact.then_some(self.phone),
                city: self.city,
                district: self.district,
                profile_image: self.profile_image,
            },
            courses,
        }
    }
}

async fn instructor_courses(
    pool: &SqlitePool,
    instructor_id: i64,
    published_only: bool,
) -> Result<Vec<InstructorCourseCard>, ServiceError> {
    let mut sql = String::from(
        "SELECT id, title, short_description, price, discount_price, duration_hours, level,
                category, thumbnail, rating, enrollment_count, is_online, location, is_published
         FROM courses WHERE instructor_id = ?",
    );
    if published_only {
        sql.push_str(" AND is_published = 1");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let cards = sqlx::query_as::<_, InstructorCourseCard>(&sql)
        .bind(instructor_id)
        .fetch_all(pool)
        .await?;
    Ok(cards)
}

#[derive(sqlx::FromRow)]
struct InstructorListRow {
    id: i64,
    bio: Option<String>,
    specialization: Option<String>,
    experience_years: i64,
    rating: f64,
    total_ratings: i64,
    total_students: i64,
    user_id: i64,
    full_name: String,
    city: Option<String>,
    district: Option<String>,
    profile_image: Option<String>,
    total_courses: i64,
}

/// Approved instructors matching the filters, best rated first.
pub async fn list_instructors(
    pool: &SqlitePool,
    query: &InstructorListQuery,
) -> Result<Vec<InstructorSummary>, ServiceError> {
    let (skip, limit) = page_window(query.skip, query.limit, 20, 100);

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT i.id, i.bio, i.specialization, i.experience_years, i.rating, i.total_ratings,
                i.total_students,
                u.id AS user_id, u.full_name, u.city, u.district, u.profile_image,
                (SELECT COUNT(*) FROM courses c
                 WHERE c.instructor_id = i.id AND c.is_published = 1) AS total_courses
         FROM instructors i
         JOIN users u ON u.id = i.user_id
         WHERE i.is_approved = 1",
    );

    if let Some(specialization) = &query.specialization {
        builder
            .push(" AND i.specialization LIKE ")
            .push_bind(format!("%{specialization}%"));
    }
    match (&query.city, &query.district) {
        (Some(city), Some(district)) => {
            builder
                .push(" AND (u.city LIKE ")
                .push_bind(format!("%{city}%"))
                .push(" OR u.district LIKE ")
                .push_bind(format!("%{district}%"))
                .push(")");
        }
        (Some(city), None) => {
            builder.push(" AND u.city LIKE ").push_bind(format!("%{city}%"));
        }
        (None, Some(district)) => {
            builder
                .push(" AND u.district LIKE ")
                .push_bind(format!("%{district}%"));
        }
        (None, None) => {}
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (u.full_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.bio LIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.specialization LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min_rating) = query.min_rating {
        builder.push(" AND i.rating >= ").push_bind(min_rating);
    }
    if let Some(min_experience) = query.min_experience {
        builder
            .push(" AND i.experience_years >= ")
            .push_bind(min_experience);
    }

    builder
        .push(" ORDER BY i.rating DESC, i.total_students DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let rows: Vec<InstructorListRow> = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| InstructorSummary {
            id: row.id,
            bio: row.bio,
            specialization: row.specialization,
            experience_years: row.experience_years,
            rating: row.rating,
            total_ratings: row.total_ratings,
            total_students: row.total_students,
            total_courses: row.total_courses,
            user: InstructorUserInfo {
                id: row.user_id,
                full_name: row.full_name,
                email: None,
                phone: None,
                city: row.city,
                district: row.district,
                profile_image: row.profile_image,
            },
        })
        .collect())
}

/// Public profile of an approved instructor with published courses.
pub async fn get_instructor(
    pool: &SqlitePool,
    instructor_id: i64,
) -> Result<InstructorProfile, ServiceError> {
    let sql = format!("{PROFILE_SELECT} WHERE i.id = ? AND i.is_approved = 1");
    let row: Option<InstructorRow> = sqlx::query_as(&sql)
        .bind(instructor_id)
        .fetch_optional(pool)
        .await?;
    let row = row.ok_or_else(|| ServiceError::not_found("Instructor not found"))?;

    let courses = instructor_courses(pool, instructor_id, true).await?;
    Ok(row.into_profile(courses, false))
}

/// Files an instructor application and flips the user role. One
/// application per user.
pub async fn apply(
    pool: &SqlitePool,
    user: &User,
    req: InstructorApplyRequest,
) -> Result<InstructorApplyResponse, ServiceError> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM instructors WHERE user_id = ?")
            .bind(user.id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(ServiceError::conflict(
            "You already have an instructor application",
        ));
    }

    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    let insert = sqlx::query(
        "INSERT INTO instructors (user_id, bio, specialization, experience_years, certification,
                                  is_approved, created_at)
         VALUES (?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(user.id)
    .bind(&req.bio)
    .bind(&req.specialization)
    .bind(req.experience_years.unwrap_or(0))
    .bind(&req.certification)
    .bind(&now)
    .execute(&mut *tx)
    .await;
    let instructor_id = match insert {
        Ok(result) => result.last_insert_rowid(),
        Err(err) if is_unique_violation(&err) => {
            return Err(ServiceError::conflict(
                "You already have an instructor application",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    sqlx::query("UPDATE users SET role = 'instructor', updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(user_id = user.id, instructor_id, "instructor application filed");

    Ok(InstructorApplyResponse {
        message: "Instructor application submitted successfully. Please wait for admin approval."
            .to_string(),
        instructor_id,
    })
}

/// The caller's own profile, contact details and unpublished courses
/// included.
pub async fn my_profile(pool: &SqlitePool, user: &User) -> Result<InstructorProfile, ServiceError> {
    let sql = format!("{PROFILE_SELECT} WHERE i.user_id = ?");
    let row: Option<InstructorRow> = sqlx::query_as(&sql)
        .bind(user.id)
        .fetch_optional(pool)
        .await?;
    let row = row.ok_or_else(|| ServiceError::not_found("Instructor profile not found"))?;

    let courses = instructor_courses(pool, row.id, false).await?;
    Ok(row.into_profile(courses, true))
}

/// Sparse update of the caller's instructor profile.
pub async fn update_profile(
    pool: &SqlitePool,
    user: &User,
    req: UpdateInstructorProfileRequest,
) -> Result<InstructorProfile, ServiceError> {
    let current: Option<(i64, Option<String>, Option<String>, i64, Option<String>)> =
        sqlx::query_as(
            "SELECT id, bio, specialization, experience_years, certification
             FROM instructors WHERE user_id = ?",
        )
        .bind(user.id)
        .fetch_optional(pool)
        .await?;
    let (instructor_id, bio, specialization, experience_years, certification) =
        current.ok_or_else(|| ServiceError::not_found("Instructor profile not found"))?;

    let bio = req.bio.resolve(bio);
    let specialization = req.specialization.resolve(specialization);
    let certification = req.certification.resolve(certification);
    let experience_years = req.experience_years.unwrap_or(experience_years);
    if experience_years < 0 {
        return Err(ServiceError::validation(
            "Experience years must not be negative",
        ));
    }

    sqlx::query(
        "UPDATE instructors
         SET bio = ?, specialization = ?, experience_years = ?, certification = ?
         WHERE id = ?",
    )
    .bind(&bio)
    .bind(&specialization)
    .bind(experience_years)
    .bind(&certification)
    .bind(instructor_id)
    .execute(pool)
    .await?;

    my_profile(pool, user).await
}

/// Distinct specializations across approved instructors.
pub async fn list_specializations(pool: &SqlitePool) -> Result<Vec<String>, ServiceError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT specialization FROM instructors
         WHERE is_approved = 1 AND specialization IS NOT NULL
         ORDER BY specialization",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(s,)| s).collect())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;
    use crate::services::test_utils;

    fn empty_query() -> InstructorListQuery {
        InstructorListQuery {
            skip: None,
            limit: None,
            specialization: None,
            city: None,
            district: None,
            search: None,
            min_rating: None,
            min_experience: None,
        }
    }

    async fn set_standing(pool: &SqlitePool, instructor_id: i64, rating: f64, students: i64) {
        sqlx::query("UPDATE instructors SET rating = ?, total_students = ? WHERE id = ?")
            .bind(rating)
            .bind(students)
            .bind(instructor_id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn listing_orders_by_rating_then_students_and_hides_unapproved() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let a = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let b = test_utils::seed_user(&pool, "b@example.com", "+905550000002").await;
        let c = test_utils::seed_user(&pool, "c@example.com", "+905550000003").await;

        let first = test_utils::seed_instructor(&pool, a, true).await;
        let second = test_utils::seed_instructor(&pool, b, true).await;
        test_utils::seed_instructor(&pool, c, false).await;

        set_standing(&pool, first, 4.5, 10).await;
        set_standing(&pool, second, 4.5, 30).await;

        let listed = list_instructors(&pool, &empty_query()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
        assert!(listed[0].user.email.is_none());
    }

    #[tokio::test]
    async fn listing_counts_published_courses_only() {
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

        let listed = list_instructors(&pool, &empty_query()).await.unwrap();
        assert_eq!(listed[0].total_courses, 1);
    }

    #[tokio::test]
    async fn listing_filters_apply() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let a = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let b = test_utils::seed_user(&pool, "b@example.com", "+905550000002").await;
        let guitarist = test_utils::seed_instructor(&pool, a, true).await;
        let potter = test_utils::seed_instructor(&pool, b, true).await;
        sqlx::query("UPDATE instructors SET specialization = 'Pottery', experience_years = 12 WHERE id = ?")
            .bind(potter)
            .execute(&pool)
            .await
            .unwrap();
        set_standing(&pool, guitarist, 3.0, 5).await;
        set_standing(&pool, potter, 4.8, 9).await;

        let mut query = empty_query();
        query.specialization = Some("pot".to_string());
        let listed = list_instructors(&pool, &query).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, potter);

        let mut query = empty_query();
        query.min_rating = Some(4.0);
        assert_eq!(list_instructors(&pool, &query).await.unwrap().len(), 1);

        let mut query = empty_query();
        query.min_experience = Some(10);
        assert_eq!(list_instructors(&pool, &query).await.unwrap().len(), 1);

        let mut query = empty_query();
        query.search = Some("User b@example.com".to_string());
        let listed = list_instructors(&pool, &query).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, potter);
    }

    #[tokio::test]
    async fn public_profile_shows_published_courses_without_contact() {
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

        let profile = get_instructor(&pool, instructor_id).await.unwrap();
        assert_eq!(profile.courses.len(), 1);
        assert_eq!(profile.total_courses, 1);
        assert!(profile.user.email.is_none());
        assert!(profile.user.phone.is_none());
    }

    #[tokio::test]
    async fn unapproved_instructor_profile_is_hidden() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, user, false).await;

        let err = get_instructor(&pool, instructor_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn apply_creates_pending_profile_and_flips_role() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user_id = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let user = test_utils::user_by_id(&pool, user_id).await;

        let response = apply(
            &pool,
            &user,
            InstructorApplyRequest {
                bio: Some("Ten years of teaching".to_string()),
                specialization: Some("Baglama".to_string()),
                experience_years: Some(10),
                certification: None,
            },
        )
        .await
        .unwrap();

        let (approved,): (bool,) =
            sqlx::query_as("SELECT is_approved FROM instructors WHERE id = ?")
                .bind(response.instructor_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(!approved);

        let updated = test_utils::user_by_id(&pool, user_id).await;
        assert_eq!(updated.role, "instructor");

        let err = apply(
            &pool,
            &updated,
            InstructorApplyRequest {
                bio: None,
                specialization: None,
                experience_years: None,
                certification: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn my_profile_includes_contact_and_unpublished_courses() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user_id = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, user_id, false).await;
        test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                is_published: false,
                ..Default::default()
            },
        )
        .await;

        let user = test_utils::user_by_id(&pool, user_id).await;
        let profile = my_profile(&pool, &user).await.unwrap();
        assert_eq!(profile.user.email.as_deref(), Some("a@example.com"));
        assert_eq!(profile.courses.len(), 1);
        assert!(!profile.courses[0].is_published);

        let stranger = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;
        let stranger = test_utils::user_by_id(&pool, stranger).await;
        let err = my_profile(&pool, &stranger).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_profile_patch_keeps_clear_and_set_apart() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user_id = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        test_utils::seed_instructor(&pool, user_id, true).await;
        let user = test_utils::user_by_id(&pool, user_id).await;

        let updated = update_profile(
            &pool,
            &user,
            UpdateInstructorProfileRequest {
                bio: Patch::Missing,
                specialization: Patch::Set("Oud".to_string()),
                experience_years: Some(7),
                certification: Patch::Missing,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Bio"));
        assert_eq!(updated.specialization.as_deref(), Some("Oud"));
        assert_eq!(updated.experience_years, 7);

        let updated = update_profile(
            &pool,
            &user,
            UpdateInstructorProfileRequest {
                bio: Patch::Clear,
                specialization: Patch::Missing,
                experience_years: None,
                certification: Patch::Missing,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.bio, None);
        assert_eq!(updated.experience_years, 7);
    }

    #[tokio::test]
    async fn update_profile_rejects_negative_experience() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let user_id = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        test_utils::seed_instructor(&pool, user_id, true).await;
        let user = test_utils::user_by_id(&pool, user_id).await;

        let err = update_profile(
            &pool,
            &user,
            UpdateInstructorProfileRequest {
                bio: Patch::Missing,
                specialization: Patch::Missing,
                experience_years: Some(-1),
                certification: Patch::Missing,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn specializations_are_distinct_and_approved_only() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let a = test_utils::seed_user(&pool, "a@example.com", "+905550000001").await;
        let b = test_utils::seed_user(&pool, "b@example.com", "+905550000002").await;
        let c = test_utils::seed_user(&pool, "c@example.com", "+905550000003").await;
        test_utils::seed_instructor(&pool, a, true).await;
        test_utils::seed_instructor(&pool, b, true).await;
        let hidden = test_utils::seed_instructor(&pool, c, false).await;
        sqlx::query("UPDATE instructors SET specialization = 'Pottery' WHERE id = ?")
            .bind(hidden)
            .execute(&pool)
            .await
            .unwrap();

        let specializations = list_specializations(&pool).await.unwrap();
        assert_eq!(specializations, vec!["Guitar".to_string()]);
    }
}
