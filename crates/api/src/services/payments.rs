use chrono::Utc;
use sqlx::SqlitePool;

use campus_auth::User;
use campus_billing::{BuyerInfo, CheckoutRequest, CourseContext, PaymentGateway};

use super::enrollments::record_enrollment;
use super::error::ServiceError;
use super::guards;
use crate::routes::models::{
    CreatedPaymentResponse, PaymentConfirmation, PaymentCourseInfo, PaymentResponse,
};

#[derive(sqlx::FromRow)]
struct CheckoutCourseRow {
    id: i64,
    title: String,
    price: f64,
    discount_price: Option<f64>,
}

/// Opens a checkout for a published course. The charged amount is frozen
/// here: the discount price when one is set, the list price otherwise.
/// A gateway failure marks the row `failed` so the attempt stays visible.
pub async fn create_payment(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    user: &User,
    course_id: i64,
    payment_method: &str,
    currency: &str,
) -> Result<CreatedPaymentResponse, ServiceError> {
    let course: Option<CheckoutCourseRow> = sqlx::query_as(
        "SELECT id, title, price, discount_price FROM courses WHERE id = ? AND is_published = 1",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    let course = course.ok_or_else(|| ServiceError::not_found("Course not found"))?;

    if guards::find_enrollment(pool, user.id, course_id)
        .await?
        .is_some()
    {
        return Err(ServiceError::conflict(
            "You are already enrolled in this course",
        ));
    }

    let live: Option<(String,)> = sqlx::query_as(
        "SELECT payment_status FROM payments
         WHERE user_id = ? AND course_id = ? AND payment_status IN ('pending', 'completed')",
    )
    .bind(user.id)
    .bind(course_id)
    .fetch_optional(pool)
    .await?;
    if let Some((status,)) = live {
        let message = if status == "completed" {
            "Payment already completed for this course"
        } else {
            "A payment for this course is already pending"
        };
        return Err(ServiceError::conflict(message));
    }

    let amount = course.discount_price.unwrap_or(course.price);
    let now = Utc::now().to_rfc3339();

    let insert = sqlx::query(
        "INSERT INTO payments (user_id, course_id, amount, currency, payment_method, payment_status, payment_date)
         VALUES (?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(user.id)
    .bind(course_id)
    .bind(amount)
    .bind(currency)
    .bind(payment_method)
    .bind(&now)
    .execute(pool)
    .await;

    // The partial unique index backstops the precondition check under
    // concurrent create-payment calls.
    let payment_id = match insert {
        Ok(result) => result.last_insert_rowid(),
        Err(err) if is_unique_violation(&err) => {
            return Err(ServiceError::conflict(
                "A payment for this course is already pending",
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let checkout = CheckoutRequest {
        amount,
        currency: currency.to_string(),
        buyer: BuyerInfo {
            id: user.id,
            name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            city: user.city.clone().unwrap_or_else(|| "Istanbul".to_string()),
            district: user
                .district
                .clone()
                .unwrap_or_else(|| "Kadikoy".to_string()),
        },
        course: CourseContext {
            id: course.id,
            title: course.title,
            price: amount,
        },
    };

    match gateway.create_transaction(&checkout).await {
        Ok(session) => {
            sqlx::query("UPDATE payments SET transaction_id = ? WHERE id = ?")
                .bind(&session.transaction_id)
                .bind(payment_id)
                .execute(pool)
                .await?;
            tracing::info!(payment_id, course_id, amount, "checkout opened");
            Ok(CreatedPaymentResponse {
                payment_id,
                status: "success".to_string(),
                payment_url: session.payment_url,
                token: session.token,
                transaction_id: session.transaction_id,
            })
        }
        Err(err) => {
            sqlx::query("UPDATE payments SET payment_status = 'failed' WHERE id = ?")
                .bind(payment_id)
                .execute(pool)
                .await?;
            tracing::warn!(payment_id, course_id, "checkout failed: {}", err);
            Err(err.into())
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentStateRow {
    id: i64,
    course_id: i64,
    payment_status: String,
    transaction_id: Option<String>,
}

/// Verifies an open payment against the gateway. On success the payment,
/// the enrollment, and both counters commit in one transaction. Confirming
/// an already-completed payment is a no-op reported as such.
pub async fn confirm_payment(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    user_id: i64,
    payment_id: i64,
) -> Result<PaymentConfirmation, ServiceError> {
    let payment: Option<PaymentStateRow> = sqlx::query_as(
        "SELECT id, course_id, payment_status, transaction_id
         FROM payments WHERE id = ? AND user_id = ?",
    )
    .bind(payment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let payment = payment.ok_or_else(|| ServiceError::not_found("Payment not found"))?;

    if payment.payment_status == "completed" {
        return Ok(PaymentConfirmation {
            status: "already_completed".to_string(),
            message: "Payment already verified".to_string(),
            enrollment_id: None,
        });
    }
    if payment.payment_status == "failed" {
        return Err(ServiceError::validation("Payment has already failed"));
    }

    let transaction_id = payment
        .transaction_id
        .ok_or_else(|| ServiceError::validation("No transaction ID found"))?;

    // Transport errors surface here and leave the row pending.
    let verification = gateway.verify_transaction(&transaction_id).await?;

    if verification.is_completed() {
        let (instructor_id,): (i64,) =
            sqlx::query_as("SELECT instructor_id FROM courses WHERE id = ?")
                .bind(payment.course_id)
                .fetch_one(pool)
                .await?;

        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE payments SET payment_status = 'completed' WHERE id = ?")
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;
        let enrollment_id =
            match record_enrollment(&mut tx, user_id, payment.course_id, instructor_id).await? {
                Some(id) => id,
                None => {
                    // Enrolled through another path while the payment was open.
                    let (id,): (i64,) = sqlx::query_as(
                        "SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?",
                    )
                    .bind(user_id)
                    .bind(payment.course_id)
                    .fetch_one(&mut *tx)
                    .await?;
                    id
                }
            };
        tx.commit().await?;

        tracing::info!(payment_id = payment.id, enrollment_id, "payment completed");
        Ok(PaymentConfirmation {
            status: "success".to_string(),
            message: "Payment verified and course enrollment completed".to_string(),
            enrollment_id: Some(enrollment_id),
        })
    } else {
        sqlx::query("UPDATE payments SET payment_status = 'failed' WHERE id = ?")
            .bind(payment.id)
            .execute(pool)
            .await?;
        tracing::warn!(payment_id = payment.id, "payment verification declined");
        Err(ServiceError::validation("Payment verification failed"))
    }
}

#[derive(sqlx::FromRow)]
struct PaymentListRow {
    id: i64,
    amount: f64,
    currency: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    payment_date: String,
    course_id: i64,
    course_title: String,
    course_thumbnail: Option<String>,
    instructor_name: String,
}

pub async fn my_payments(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<PaymentResponse>, ServiceError> {
    let rows = sqlx::query_as::<_, PaymentListRow>(
        "SELECT p.id, p.amount, p.currency, p.payment_method, p.payment_status, p.transaction_id,
                p.payment_date, c.id AS course_id, c.title AS course_title,
                c.thumbnail AS course_thumbnail, u.full_name AS instructor_name
         FROM payments p
         JOIN courses c ON c.id = p.course_id
         JOIN instructors i ON i.id = c.instructor_id
         JOIN users u ON u.id = i.user_id
         WHERE p.user_id = ?
         ORDER BY p.payment_date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PaymentResponse {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            transaction_id: row.transaction_id,
            payment_date: row.payment_date,
            course: PaymentCourseInfo {
                id: row.course_id,
                title: row.course_title,
                thumbnail: row.course_thumbnail,
                instructor_name: row.instructor_name,
                price: None,
                discount_price: None,
            },
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct PaymentDetailRow {
    id: i64,
    amount: f64,
    currency: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    payment_date: String,
    course_id: i64,
    course_title: String,
    course_thumbnail: Option<String>,
    instructor_name: String,
    course_price: f64,
    course_discount_price: Option<f64>,
}

pub async fn payment_by_id(
    pool: &SqlitePool,
    user_id: i64,
    payment_id: i64,
) -> Result<PaymentResponse, ServiceError> {
    let row: Option<PaymentDetailRow> = sqlx::query_as(
        "SELECT p.id, p.amount, p.currency, p.payment_method, p.payment_status, p.transaction_id,
                p.payment_date, c.id AS course_id, c.title AS course_title,
                c.thumbnail AS course_thumbnail, u.full_name AS instructor_name,
                c.price AS course_price, c.discount_price AS course_discount_price
         FROM payments p
         JOIN courses c ON c.id = p.course_id
         JOIN instructors i ON i.id = c.instructor_id
         JOIN users u ON u.id = i.user_id
         WHERE p.id = ? AND p.user_id = ?",
    )
    .bind(payment_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    let row = row.ok_or_else(|| ServiceError::not_found("Payment not found"))?;

    Ok(PaymentResponse {
        id: row.id,
        amount: row.amount,
        currency: row.currency,
        payment_method: row.payment_method,
        payment_status: row.payment_status,
        transaction_id: row.transaction_id,
        payment_date: row.payment_date,
        course: PaymentCourseInfo {
            id: row.course_id,
            title: row.course_title,
            thumbnail: row.course_thumbnail,
            instructor_name: row.instructor_name,
            price: Some(row.course_price),
            discount_price: row.course_discount_price,
        },
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.message().contains("UNIQUE constraint failed"))
        .unwrap_or(false)
}
