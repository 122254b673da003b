//! Shared fixtures for service-level tests. Every helper works against a
//! migrated SQLite database in a per-test temp directory.

use chrono::Utc;
use sqlx::SqlitePool;
use tempfile::TempDir;

use campus_auth::User;
use campus_config::DatabaseConfig;

pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("campus-test.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 5,
    };
    let pool = campus_database::initialize_database(&config)
        .await
        .expect("test database");
    (pool, temp_dir)
}

pub async fn seed_user(pool: &SqlitePool, email: &str, phone: &str) -> i64 {
    seed_user_with_role(pool, email, phone, "student").await
}

pub async fn seed_user_with_role(pool: &SqlitePool, email: &str, phone: &str, role: &str) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO users (email, phone, password_hash, full_name, role, is_active, is_verified, city, district, created_at, updated_at)
         VALUES (?, ?, 'hash', ?, ?, 1, 1, 'Istanbul', 'Kadikoy', ?, ?)",
    )
    .bind(email)
    .bind(phone)
    .bind(format!("User {email}"))
    .bind(role)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed user");
    result.last_insert_rowid()
}

pub async fn user_by_id(pool: &SqlitePool, id: i64) -> User {
    sqlx::query_as::<_, User>(
        "SELECT id, email, phone, full_name, role, is_active, is_verified, city, district, profile_image, created_at
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .expect("user row")
}

pub async fn seed_instructor(pool: &SqlitePool, user_id: i64, approved: bool) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO instructors (user_id, bio, specialization, experience_years, is_approved, created_at)
         VALUES (?, 'Bio', 'Guitar', 5, ?, ?)",
    )
    .bind(user_id)
    .bind(approved)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed instructor");
    result.last_insert_rowid()
}

pub struct CourseSeed {
    pub title: &'static str,
    pub category: &'static str,
    pub level: &'static str,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub duration_hours: i64,
    pub is_online: bool,
    pub is_published: bool,
    pub is_featured: bool,
    pub location: Option<&'static str>,
    pub enrollment_count: i64,
    pub rating: f64,
    pub total_ratings: i64,
}

impl Default for CourseSeed {
    fn default() -> Self {
        Self {
            title: "Rust for Backend Engineers",
            category: "programming",
            level: "beginner",
            price: 100.0,
            discount_price: None,
            duration_hours: 10,
            is_online: true,
            is_published: true,
            is_featured: false,
            location: None,
            enrollment_count: 0,
            rating: 0.0,
            total_ratings: 0,
        }
    }
}

pub async fn seed_course(pool: &SqlitePool, instructor_id: i64, seed: CourseSeed) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO courses (instructor_id, title, description, category, level, price, discount_price,
                              duration_hours, location, is_online, is_published, is_featured,
                              enrollment_count, rating, total_ratings, created_at, updated_at)
         VALUES (?, ?, 'Course description', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(instructor_id)
    .bind(seed.title)
    .bind(seed.category)
    .bind(seed.level)
    .bind(seed.price)
    .bind(seed.discount_price)
    .bind(seed.duration_hours)
    .bind(seed.location)
    .bind(seed.is_online)
    .bind(seed.is_published)
    .bind(seed.is_featured)
    .bind(seed.enrollment_count)
    .bind(seed.rating)
    .bind(seed.total_ratings)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed course");
    result.last_insert_rowid()
}

pub async fn seed_lesson(pool: &SqlitePool, course_id: i64, order_index: i64, preview: bool) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO lessons (course_id, title, duration_minutes, order_index, is_preview, created_at)
         VALUES (?, ?, 30, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(format!("Lesson {order_index}"))
    .bind(order_index)
    .bind(preview)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed lesson");
    result.last_insert_rowid()
}

/// Inserts an enrollment row directly, without touching the counters.
pub async fn seed_enrollment(pool: &SqlitePool, student_id: i64, course_id: i64) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO enrollments (student_id, course_id, enrolled_at) VALUES (?, ?, ?)",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed enrollment");
    result.last_insert_rowid()
}

pub async fn seed_payment(
    pool: &SqlitePool,
    user_id: i64,
    course_id: i64,
    amount: f64,
    status: &str,
    transaction_id: Option<&str>,
) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO payments (user_id, course_id, amount, currency, payment_method, payment_status, transaction_id, payment_date)
         VALUES (?, ?, ?, 'TRY', 'iyzico', ?, ?, ?)",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(amount)
    .bind(status)
    .bind(transaction_id)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed payment");
    result.last_insert_rowid()
}

pub async fn seed_review(
    pool: &SqlitePool,
    reviewer_id: i64,
    course_id: i64,
    instructor_id: i64,
    rating: i64,
    approved: bool,
) -> i64 {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO reviews (reviewer_id, course_id, instructor_id, rating, comment, is_approved, created_at)
         VALUES (?, ?, ?, ?, 'Great course', ?, ?)",
    )
    .bind(reviewer_id)
    .bind(course_id)
    .bind(instructor_id)
    .bind(rating)
    .bind(approved)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed review");
    result.last_insert_rowid()
}

pub async fn course_counters(pool: &SqlitePool, course_id: i64) -> (i64, f64, i64) {
    sqlx::query_as(
        "SELECT enrollment_count, rating, total_ratings FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_one(pool)
    .await
    .expect("course counters")
}

pub async fn instructor_counters(pool: &SqlitePool, instructor_id: i64) -> (i64, f64, i64) {
    sqlx::query_as(
        "SELECT total_students, rating, total_ratings FROM instructors WHERE id = ?",
    )
    .bind(instructor_id)
    .fetch_one(pool)
    .await
    .expect("instructor counters")
}

pub async fn enrollment_count(pool: &SqlitePool, course_id: i64) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM enrollments WHERE course_id = ?")
            .bind(course_id)
            .fetch_one(pool)
            .await
            .expect("enrollment count");
    count
}
