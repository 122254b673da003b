use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::error::ServiceError;
use super::guards::ApprovedInstructor;
use crate::routes::models::{
    CourseDetail, CourseListQuery, CourseSummary, CreateCourseRequest, InstructorCard,
    LessonResponse, UpdateCourseRequest,
};
use crate::util::page_window;

const LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

const COURSE_SELECT: &str = "SELECT c.id, c.instructor_id, c.title, c.description, c.short_description, c.category, \
     c.subcategory, c.level, c.language, c.price, c.discount_price, c.duration_hours, \
     c.thumbnail, c.location, c.is_online, c.is_published, c.is_featured, c.enrollment_count, \
     c.rating, c.total_ratings, c.created_at, c.updated_at, \
     u.full_name AS instructor_name, i.bio AS instructor_bio, i.rating AS instructor_rating, \
     i.total_students AS instructor_total_students, i.experience_years AS instructor_experience_years \
     FROM courses c \
     JOIN instructors i ON i.id = c.instructor_id \
     JOIN users u ON u.id = i.user_id";

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    instructor_id: i64,
    title: String,
    description: String,
    short_description: Option<String>,
    category: String,
    subcategory: Option<String>,
    level: String,
    language: String,
    price: f64,
    discount_price: Option<f64>,
    duration_hours: i64,
    thumbnail: Option<String>,
    location: Option<String>,
    is_online: bool,
    is_published: bool,
    is_featured: bool,
    enrollment_count: i64,
    rating: f64,
    total_ratings: i64,
    created_at: String,
    updated_at: String,
    instructor_name: String,
    instructor_bio: Option<String>,
    instructor_rating: f64,
    instructor_total_students: i64,
    instructor_experience_years: i64,
}

impl CourseRow {
    fn into_summary(self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            category: self.category,
            subcategory: self.subcategory,
            level: self.level,
            language: self.language,
            price: self.price,
            discount_price: self.discount_price,
            duration_hours: self.duration_hours,
            thumbnail: self.thumbnail,
            location: self.location,
            is_online: self.is_online,
            is_published: self.is_published,
            is_featured: self.is_featured,
            enrollment_count: self.enrollment_count,
            rating: self.rating,
            total_ratings: self.total_ratings,
            created_at: self.created_at,
            updated_at: self.updated_at,
            instructor: InstructorCard {
                id: self.instructor_id,
                name: self.instructor_name,
                bio: self.instructor_bio,
                rating: self.instructor_rating,
                total_students: self.instructor_total_students,
                experience_years: self.instructor_experience_years,
            },
        }
    }
}

/// Published courses matching the query filters, newest first.
pub async fn list_courses(
    pool: &SqlitePool,
    query: &CourseListQuery,
) -> Result<Vec<CourseSummary>, ServiceError> {
    let (skip, limit) = page_window(query.skip, query.limit, 20, 100);

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(COURSE_SELECT);
    builder.push(" WHERE c.is_published = 1");

    if let Some(category) = &query.category {
        builder.push(" AND c.category = ").push_bind(category);
    }
    if let Some(level) = &query.level {
        builder.push(" AND c.level = ").push_bind(level);
    }
    if let Some(is_online) = query.is_online {
        builder.push(" AND c.is_online = ").push_bind(is_online);
    }
    if let Some(featured) = query.featured {
        builder.push(" AND c.is_featured = ").push_bind(featured);
    }
    if let Some(city) = &query.city {
        builder
            .push(" AND c.location LIKE ")
            .push_bind(format!("%{city}%"));
    }
    if let Some(district) = &query.district {
        builder
            .push(" AND c.location LIKE ")
            .push_bind(format!("%{district}%"));
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (c.title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.category LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min_price) = query.min_price {
        builder.push(" AND c.price >= ").push_bind(min_price);
    }
    if let Some(max_price) = query.max_price {
        builder.push(" AND c.price <= ").push_bind(max_price);
    }

    builder
        .push(" ORDER BY c.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(skip);

    let rows: Vec<CourseRow> = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().map(CourseRow::into_summary).collect())
}

/// A published course with its instructor summary and preview lessons.
pub async fn get_course(pool: &SqlitePool, course_id: i64) -> Result<CourseDetail, ServiceError> {
    let sql = format!("{COURSE_SELECT} WHERE c.id = ? AND c.is_published = 1");
    let row: Option<CourseRow> = sqlx::query_as(&sql)
        .bind(course_id)
        .fetch_optional(pool)
        .await?;
    let row = row.ok_or_else(|| ServiceError::not_found("Course not found"))?;

    let preview_lessons = sqlx::query_as::<_, LessonResponse>(
        "SELECT id, course_id, title, description, video_url, duration_minutes, order_index,
                is_preview, notes, created_at
         FROM lessons
         WHERE course_id = ? AND is_preview = 1
         ORDER BY order_index ASC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(CourseDetail {
        course: row.into_summary(),
        preview_lessons,
    })
}

async fn course_by_id_unchecked(
    pool: &SqlitePool,
    course_id: i64,
) -> Result<CourseSummary, ServiceError> {
    let sql = format!("{COURSE_SELECT} WHERE c.id = ?");
    let row: Option<CourseRow> = sqlx::query_as(&sql)
        .bind(course_id)
        .fetch_optional(pool)
        .await?;
    row.map(CourseRow::into_summary)
        .ok_or_else(|| ServiceError::not_found("Course not found"))
}

fn validate_level(level: &str) -> Result<(), ServiceError> {
    if LEVELS.contains(&level) {
        Ok(())
    } else {
        Err(ServiceError::validation(
            "Course level must be one of beginner, intermediate, advanced",
        ))
    }
}

/// Creates an unpublished course owned by the instructor.
pub async fn create_course(
    pool: &SqlitePool,
    instructor: ApprovedInstructor,
    req: CreateCourseRequest,
) -> Result<CourseSummary, ServiceError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ServiceError::validation("Course title must not be empty"));
    }
    if req.price < 0.0 {
        return Err(ServiceError::validation(
            "Course price must not be negative",
        ));
    }
    let level = req.level.unwrap_or_else(|| "beginner".to_string());
    validate_level(&level)?;
    let language = req.language.unwrap_or_else(|| "Turkish".to_string());
    let is_online = req.is_online.unwrap_or(true);
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO courses (instructor_id, title, description, short_description, category,
                              subcategory, level, language, price, discount_price, duration_hours,
                              location, is_online, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(instructor.id)
    .bind(&title)
    .bind(&req.description)
    .bind(&req.short_description)
    .bind(&req.category)
    .bind(&req.subcategory)
    .bind(&level)
    .bind(&language)
    .bind(req.price)
    .bind(req.discount_price)
    .bind(req.duration_hours)
    .bind(&req.location)
    .bind(is_online)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let course_id = result.last_insert_rowid();
    tracing::info!(course_id, instructor_id = instructor.id, "course created");
    course_by_id_unchecked(pool, course_id).await
}

#[derive(sqlx::FromRow)]
struct CurrentCourse {
    title: String,
    description: String,
    short_description: Option<String>,
    category: String,
    subcategory: Option<String>,
    level: String,
    language: String,
    price: f64,
    discount_price: Option<f64>,
    duration_hours: i64,
    location: Option<String>,
    is_online: bool,
}

/// Sparse update of a course the instructor owns. Counters, aggregates,
/// and publication flags are out of reach here.
pub async fn update_course(
    pool: &SqlitePool,
    instructor: ApprovedInstructor,
    course_id: i64,
    req: UpdateCourseRequest,
) -> Result<CourseSummary, ServiceError> {
    let current: Option<CurrentCourse> = sqlx::query_as(
        "SELECT title, description, short_description, category, subcategory, level, language,
                price, discount_price, duration_hours, location, is_online
         FROM courses WHERE id = ? AND instructor_id = ?",
    )
    .bind(course_id)
    .bind(instructor.id)
    .fetch_optional(pool)
    .await?;
    let current = current.ok_or_else(|| {
        ServiceError::not_found("Course not found or you don't have permission to edit it")
    })?;

    let title = req.title.unwrap_or(current.title);
    if title.trim().is_empty() {
        return Err(ServiceError::validation("Course title must not be empty"));
    }
    let price = req.price.unwrap_or(current.price);
    if price < 0.0 {
        return Err(ServiceError::validation(
            "Course price must not be negative",
        ));
    }
    let level = req.level.unwrap_or(current.level);
    validate_level(&level)?;

    let description = req.description.unwrap_or(current.description);
    let category = req.category.unwrap_or(current.category);
    let language = req.language.unwrap_or(current.language);
    let duration_hours = req.duration_hours.unwrap_or(current.duration_hours);
    let is_online = req.is_online.unwrap_or(current.is_online);
    let short_description = req.short_description.resolve(current.short_description);
    let subcategory = req.subcategory.resolve(current.subcategory);
    let discount_price = req.discount_price.resolve(current.discount_price);
    let location = req.location.resolve(current.location);
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE courses
         SET title = ?, description = ?, short_description = ?, category = ?, subcategory = ?,
             level = ?, language = ?, price = ?, discount_price = ?, duration_hours = ?,
             location = ?, is_online = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(&short_description)
    .bind(&category)
    .bind(&subcategory)
    .bind(&level)
    .bind(&language)
    .bind(price)
    .bind(discount_price)
    .bind(duration_hours)
    .bind(&location)
    .bind(is_online)
    .bind(&now)
    .bind(course_id)
    .execute(pool)
    .await?;

    course_by_id_unchecked(pool, course_id).await
}

/// Records the stored thumbnail path for a course the instructor owns.
pub async fn set_thumbnail(
    pool: &SqlitePool,
    instructor: ApprovedInstructor,
    course_id: i64,
    thumbnail: &str,
) -> Result<(), ServiceError> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE courses SET thumbnail = ?, updated_at = ? WHERE id = ? AND instructor_id = ?",
    )
    .bind(thumbnail)
    .bind(&now)
    .bind(course_id)
    .bind(instructor.id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ServiceError::not_found(
            "Course not found or you don't have permission to edit it",
        ));
    }
    Ok(())
}

/// Distinct categories across published courses.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<String>, ServiceError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT category FROM courses WHERE is_published = 1 ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(category,)| category).collect())
}
