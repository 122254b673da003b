//! Tutor endpoints: chat, quiz generation, study plans, recommendations
//! and the per-user interaction log.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use campus_assistant::{
    build_study_plan, parse_quiz_response, quiz_prompt, Assistant, ChatRequest, STUDY_PLAN_MODEL,
    TUTOR_SYSTEM_PROMPT,
};
use campus_auth::User;

use super::error::ServiceError;
use super::guards::require_enrollment;
use crate::routes::models::{
    ChatMessageRequest, ChatReply, CourseRecommendation, InteractionEntry, QuizRequest,
    QuizResponse, RecommendationsResponse, StudyPlanRequest, StudyPlanResponse, UserStats,
};

const QUIZ_MAX_TOKENS: u32 = 1500;

/// Lines describing the student that are prepended to the tutor persona.
async fn learning_context(pool: &SqlitePool, user: &User) -> Result<String, ServiceError> {
    let enrolled: Vec<(String, f64)> = sqlx::query_as(
        "SELECT c.title, e.progress_percentage
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.student_id = ?
         ORDER BY e.id ASC",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    let mut lines = vec![
        format!("Kullanıcı: {}", user.full_name),
        format!("Kayıtlı kurs sayısı: {}", enrolled.len()),
    ];
    if !enrolled.is_empty() {
        lines.push("Aktif kurslar:".to_string());
        for (title, progress) in enrolled.iter().take(3) {
            lines.push(format!("- {title} (İlerleme: {progress:.1}%)"));
        }
    }
    Ok(lines.join("\n"))
}

async fn save_interaction(
    pool: &SqlitePool,
    user_id: i64,
    interaction_type: &str,
    input: Value,
    output: Value,
    model_used: &str,
) -> Result<(), ServiceError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO ai_interactions (user_id, interaction_type, input_data, output_data,
                                      model_used, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(interaction_type)
    .bind(input.to_string())
    .bind(output.to_string())
    .bind(model_used)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Tutor chat with the student's learning context folded into the persona.
pub async fn chat(
    pool: &SqlitePool,
    assistant: &Assistant,
    user: &User,
    req: ChatMessageRequest,
) -> Result<ChatReply, ServiceError> {
    let user_context = learning_context(pool, user).await?;
    let full_context = format!(
        "{user_context}\n{}",
        req.context.as_deref().unwrap_or_default()
    );

    let request = ChatRequest::new(&req.message)
        .with_system(format!("{TUTOR_SYSTEM_PROMPT}\n\nBağlam: {full_context}"));
    let outcome = assistant.complete(&request).await?;

    save_interaction(
        pool,
        user.id,
        "chat",
        json!({"message": req.message, "context": req.context}),
        json!({"response": outcome.text}),
        &outcome.model_used,
    )
    .await?;

    Ok(ChatReply {
        response: outcome.text,
        model_used: outcome.model_used,
    })
}

/// Multiple-choice quiz over a course topic. The provider reply must be the
/// strict JSON the prompt asks for.
pub async fn generate_quiz(
    pool: &SqlitePool,
    assistant: &Assistant,
    user: &User,
    req: QuizRequest,
) -> Result<QuizResponse, ServiceError> {
    let question_count = req.question_count.unwrap_or(5);
    if !(1..=20).contains(&question_count) {
        return Err(ServiceError::validation(
            "Question count must be between 1 and 20",
        ));
    }
    let difficulty = req.difficulty.as_deref().unwrap_or("medium");

    require_enrollment(
        pool,
        user.id,
        req.course_id,
        "You must be enrolled in this course to generate quizzes",
    )
    .await?;

    // The enrollment guard passed, so the course row exists.
    let (course_title,): (String,) = sqlx::query_as("SELECT title FROM courses WHERE id = ?")
        .bind(req.course_id)
        .fetch_one(pool)
        .await?;
    let topic = format!("{course_title} - {}", req.topic);

    let request = ChatRequest::new(quiz_prompt(&topic, difficulty, question_count))
        .with_max_tokens(QUIZ_MAX_TOKENS);
    let outcome = assistant.complete(&request).await?;
    let questions = parse_quiz_response(&outcome.text)?;

    save_interaction(
        pool,
        user.id,
        "quiz",
        json!({
            "course_id": req.course_id,
            "topic": req.topic,
            "difficulty": difficulty,
            "question_count": question_count,
        }),
        json!({"questions": questions}),
        &outcome.model_used,
    )
    .await?;

    Ok(QuizResponse {
        questions,
        model_used: outcome.model_used,
    })
}

/// Study plan computed from course metadata and the student's progress.
/// No provider round trip.
pub async fn study_plan(
    pool: &SqlitePool,
    user: &User,
    req: StudyPlanRequest,
) -> Result<StudyPlanResponse, ServiceError> {
    let hours_per_week = req.available_hours_per_week.unwrap_or(10);
    if !(1..=80).contains(&hours_per_week) {
        return Err(ServiceError::validation(
            "Available hours per week must be between 1 and 80",
        ));
    }
    let target_weeks = req.target_completion_weeks.unwrap_or(4);
    if !(1..=52).contains(&target_weeks) {
        return Err(ServiceError::validation(
            "Target completion weeks must be between 1 and 52",
        ));
    }

    let enrollment = require_enrollment(
        pool,
        user.id,
        req.course_id,
        "You must be enrolled in this course to generate study plans",
    )
    .await?;

    let (course_title, duration_hours): (String, i64) =
        sqlx::query_as("SELECT title, duration_hours FROM courses WHERE id = ?")
            .bind(req.course_id)
            .fetch_one(pool)
            .await?;

    let outcome = build_study_plan(
        &course_title,
        duration_hours,
        enrollment.progress_percentage,
        hours_per_week,
        target_weeks,
    );

    save_interaction(
        pool,
        user.id,
        "study_plan",
        json!({
            "course_id": req.course_id,
            "available_hours_per_week": hours_per_week,
            "target_completion_weeks": target_weeks,
        }),
        json!({"plan": outcome.plan, "recommendations": outcome.recommendations}),
        STUDY_PLAN_MODEL,
    )
    .await?;

    Ok(StudyPlanResponse {
        plan: outcome.plan,
        recommendations: outcome.recommendations,
        model_used: STUDY_PLAN_MODEL.to_string(),
    })
}

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: i64,
    title: String,
    category: String,
    level: String,
    price: f64,
    discount_price: Option<f64>,
    rating: f64,
    enrollment_count: i64,
    thumbnail: Option<String>,
}

impl RecommendationRow {
    fn into_recommendation(self, reason: String) -> CourseRecommendation {
        CourseRecommendation {
            id: self.id,
            title: self.title,
            category: self.category,
            level: self.level,
            price: self.price,
            discount_price: self.discount_price,
            rating: self.rating,
            enrollment_count: self.enrollment_count,
            thumbnail: self.thumbnail,
            reason,
        }
    }
}

const RECOMMENDATION_SELECT: &str = "SELECT id, title, category, level, price, discount_price, rating, enrollment_count, \
     thumbnail FROM courses WHERE is_published = 1";

/// Course suggestions. New students get the most popular published courses;
/// everyone else gets top-rated courses from the categories they already
/// study, minus what they are enrolled in.
pub async fn recommendations(
    pool: &SqlitePool,
    user: &User,
) -> Result<RecommendationsResponse, ServiceError> {
    let enrolled: Vec<(i64, Option<String>, String)> = sqlx::query_as(
        "SELECT e.course_id, e.completed_at, c.category
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.student_id = ?",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    if enrolled.is_empty() {
        let sql = format!("{RECOMMENDATION_SELECT} ORDER BY enrollment_count DESC LIMIT 5");
        let rows: Vec<RecommendationRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
        return Ok(RecommendationsResponse {
            recommendations: rows
                .into_iter()
                .map(|row| row.into_recommendation("Popüler kurs".to_string()))
                .collect(),
            message: "Size özel kurs önerileri".to_string(),
            kind: Some("new_user".to_string()),
            user_stats: None,
        });
    }

    let completed = enrolled.iter().filter(|(_, done, _)| done.is_some()).count() as i64;
    let in_progress = enrolled.len() as i64 - completed;
    let mut categories: Vec<String> = Vec::new();
    for (_, _, category) in &enrolled {
        if !categories.contains(category) {
            categories.push(category.clone());
        }
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(RECOMMENDATION_SELECT);
    builder.push(" AND category IN (");
    let mut separated = builder.separated(", ");
    for category in &categories {
        separated.push_bind(category);
    }
    builder.push(") AND id NOT IN (");
    let mut separated = builder.separated(", ");
    for (course_id, _, _) in &enrolled {
        separated.push_bind(course_id);
    }
    builder.push(") ORDER BY rating DESC LIMIT 5");

    let rows: Vec<RecommendationRow> = builder.build_query_as().fetch_all(pool).await?;
    let recommendations = rows
        .into_iter()
        .map(|row| {
            let reason = format!("{} kategorisindeki ilginiz nedeniyle", row.category);
            row.into_recommendation(reason)
        })
        .collect();

    Ok(RecommendationsResponse {
        recommendations,
        message: "Öğrenme geçmişinize göre öneriler".to_string(),
        kind: Some("personalized".to_string()),
        user_stats: Some(UserStats {
            completed_courses: completed,
            in_progress_courses: in_progress,
            favorite_categories: categories,
        }),
    })
}

/// The caller's ten latest interactions, optionally filtered by type.
pub async fn my_interactions(
    pool: &SqlitePool,
    user_id: i64,
    interaction_type: Option<&str>,
) -> Result<Vec<InteractionEntry>, ServiceError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, interaction_type, model_used, created_at, input_data, output_data
         FROM ai_interactions WHERE user_id = ",
    );
    builder.push_bind(user_id);
    if let Some(kind) = interaction_type {
        builder.push(" AND interaction_type = ").push_bind(kind);
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT 10");

    let rows: Vec<(i64, String, String, String, String, String)> =
        builder.build_query_as().fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(|(id, interaction_type, model_used, created_at, input, output)| InteractionEntry {
            id,
            interaction_type,
            model_used,
            created_at,
            input: parse_logged_json(input),
            output: parse_logged_json(output),
        })
        .collect())
}

fn parse_logged_json(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use campus_assistant::{AssistantError, ChatProvider, QuizQuestion};

    use super::*;
    use crate::services::test_utils;

    struct ScriptedProvider {
        name: &'static str,
        reply: String,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, reply: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: reply.into(),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, AssistantError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn assistant_with(provider: Arc<ScriptedProvider>) -> Assistant {
        Assistant::new(vec![provider as Arc<dyn ChatProvider>])
    }

    fn quiz_reply() -> String {
        serde_json::json!({
            "questions": [{
                "question": "Sahiplik nedir?",
                "options": ["A", "B", "C", "D"],
                "correct_answer": 1,
                "explanation": "Bellek güvenliği"
            }]
        })
        .to_string()
    }

    async fn enrolled_student(pool: &SqlitePool) -> (User, i64) {
        let owner = test_utils::seed_user(pool, "i@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(pool, owner, true).await;
        let course_id = test_utils::seed_course(pool, instructor_id, Default::default()).await;
        let student = test_utils::seed_user(pool, "s@example.com", "+905550000002").await;
        test_utils::seed_enrollment(pool, student, course_id).await;
        (test_utils::user_by_id(pool, student).await, course_id)
    }

    #[tokio::test]
    async fn chat_folds_learning_context_into_the_persona() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, _) = enrolled_student(&pool).await;
        let provider = ScriptedProvider::new("gemini", "Merhaba!");
        let assistant = assistant_with(provider.clone());

        let reply = chat(
            &pool,
            &assistant,
            &student,
            ChatMessageRequest {
                message: "Nasıl çalışmalıyım?".to_string(),
                context: Some("Sınav yaklaşıyor".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(reply.response, "Merhaba!");
        assert_eq!(reply.model_used, "gemini");

        let seen = provider.last_request.lock().unwrap().clone().unwrap();
        let system = seen.system.unwrap();
        assert!(system.contains("Kullanıcı: User s@example.com"));
        assert!(system.contains("Kayıtlı kurs sayısı: 1"));
        assert!(system.contains("Rust for Backend Engineers (İlerleme: 0.0%)"));
        assert!(system.contains("Sınav yaklaşıyor"));

        let logged = my_interactions(&pool, student.id, None).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].interaction_type, "chat");
        assert_eq!(logged[0].output["response"], "Merhaba!");
    }

    #[tokio::test]
    async fn chat_without_providers_is_unavailable_and_unlogged() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, _) = enrolled_student(&pool).await;
        let assistant = Assistant::new(vec![]);

        let err = chat(
            &pool,
            &assistant,
            &student,
            ChatMessageRequest {
                message: "Merhaba".to_string(),
                context: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        assert!(my_interactions(&pool, student.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quiz_count_is_validated_before_anything_else() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, course_id) = enrolled_student(&pool).await;
        let assistant = Assistant::new(vec![]);

        for count in [0u32, 21] {
            let err = generate_quiz(
                &pool,
                &assistant,
                &student,
                QuizRequest {
                    course_id,
                    topic: "Ownership".to_string(),
                    difficulty: None,
                    question_count: Some(count),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn quiz_requires_enrollment() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (_, course_id) = enrolled_student(&pool).await;
        let outsider = test_utils::seed_user(&pool, "o@example.com", "+905550000003").await;
        let outsider = test_utils::user_by_id(&pool, outsider).await;
        let assistant = assistant_with(ScriptedProvider::new("gemini", quiz_reply()));

        let err = generate_quiz(
            &pool,
            &assistant,
            &outsider,
            QuizRequest {
                course_id,
                topic: "Ownership".to_string(),
                difficulty: None,
                question_count: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn quiz_combines_course_title_with_topic_and_parses_reply() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, course_id) = enrolled_student(&pool).await;
        let provider = ScriptedProvider::new("gemini", quiz_reply());
        let assistant = assistant_with(provider.clone());

        let quiz = generate_quiz(
            &pool,
            &assistant,
            &student,
            QuizRequest {
                course_id,
                topic: "Ownership".to_string(),
                difficulty: None,
                question_count: Some(3),
            },
        )
        .await
        .unwrap();

        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_answer, 1);

        let seen = provider.last_request.lock().unwrap().clone().unwrap();
        assert!(seen.message.contains("Rust for Backend Engineers - Ownership"));
        assert!(seen.message.contains("3 adet"));
        assert!(seen.message.contains("medium"));
        assert_eq!(seen.max_tokens, QUIZ_MAX_TOKENS);

        let logged = my_interactions(&pool, student.id, Some("quiz")).await.unwrap();
        assert_eq!(logged.len(), 1);
        let questions: Vec<QuizQuestion> =
            serde_json::from_value(logged[0].output["questions"].clone()).unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[tokio::test]
    async fn malformed_quiz_reply_is_a_validation_error() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, course_id) = enrolled_student(&pool).await;
        let assistant = assistant_with(ScriptedProvider::new("gemini", "maalesef json yok"));

        let err = generate_quiz(
            &pool,
            &assistant,
            &student,
            QuizRequest {
                course_id,
                topic: "Ownership".to_string(),
                difficulty: None,
                question_count: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(my_interactions(&pool, student.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn study_plan_validates_ranges() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, course_id) = enrolled_student(&pool).await;

        for (hours, weeks) in [(0u32, 4u32), (81, 4), (10, 0), (10, 53)] {
            let err = study_plan(
                &pool,
                &student,
                StudyPlanRequest {
                    course_id,
                    available_hours_per_week: Some(hours),
                    target_completion_weeks: Some(weeks),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn study_plan_is_internal_and_uses_progress() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let (student, course_id) = enrolled_student(&pool).await;
        sqlx::query(
            "UPDATE enrollments SET progress_percentage = 50 WHERE student_id = ? AND course_id = ?",
        )
        .bind(student.id)
        .bind(course_id)
        .execute(&pool)
        .await
        .unwrap();

        let response = study_plan(
            &pool,
            &student,
            StudyPlanRequest {
                course_id,
                available_hours_per_week: Some(5),
                target_completion_weeks: Some(2),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.model_used, "internal");
        assert_eq!(response.plan.weekly_schedule.len(), 2);
        assert_eq!(response.plan.current_progress, "50.0% complete");

        let logged = my_interactions(&pool, student.id, Some("study_plan"))
            .await
            .unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].model_used, "internal");
    }

    #[tokio::test]
    async fn new_students_get_popular_courses() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let owner = test_utils::seed_user(&pool, "i@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, owner, true).await;
        for (title, count) in [("Quiet", 1i64), ("Crowded", 10), ("Middling", 5)] {
            test_utils::seed_course(
                &pool,
                instructor_id,
                test_utils::CourseSeed {
                    title,
                    enrollment_count: count,
                    ..Default::default()
                },
            )
            .await;
        }
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;
        let student = test_utils::user_by_id(&pool, student).await;

        let response = recommendations(&pool, &student).await.unwrap();
        assert_eq!(response.kind.as_deref(), Some("new_user"));
        assert!(response.user_stats.is_none());
        assert_eq!(response.recommendations[0].title, "Crowded");
        assert_eq!(response.recommendations[0].reason, "Popüler kurs");
    }

    #[tokio::test]
    async fn personalized_recommendations_follow_enrolled_categories() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let owner = test_utils::seed_user(&pool, "i@example.com", "+905550000001").await;
        let instructor_id = test_utils::seed_instructor(&pool, owner, true).await;
        let enrolled_course =
            test_utils::seed_course(&pool, instructor_id, Default::default()).await;
        test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                title: "Advanced Rust",
                rating: 4.5,
                ..Default::default()
            },
        )
        .await;
        test_utils::seed_course(
            &pool,
            instructor_id,
            test_utils::CourseSeed {
                title: "Baglama",
                category: "music",
                rating: 5.0,
                ..Default::default()
            },
        )
        .await;

        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000002").await;
        test_utils::seed_enrollment(&pool, student, enrolled_course).await;
        let student = test_utils::user_by_id(&pool, student).await;

        let response = recommendations(&pool, &student).await.unwrap();
        assert_eq!(response.kind.as_deref(), Some("personalized"));
        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].title, "Advanced Rust");
        assert!(response.recommendations[0]
            .reason
            .contains("programming kategorisindeki"));

        let stats = response.user_stats.unwrap();
        assert_eq!(stats.in_progress_courses, 1);
        assert_eq!(stats.completed_courses, 0);
        assert_eq!(stats.favorite_categories, vec!["programming".to_string()]);
    }

    #[tokio::test]
    async fn interaction_log_caps_at_ten_and_filters_by_type() {
        let (pool, _dir) = test_utils::create_test_pool().await;
        let student = test_utils::seed_user(&pool, "s@example.com", "+905550000001").await;

        for i in 0..12 {
            save_interaction(
                &pool,
                student,
                "chat",
                json!({"message": format!("m{i}")}),
                json!({"response": "ok"}),
                "gemini",
            )
            .await
            .unwrap();
        }
        save_interaction(
            &pool,
            student,
            "quiz",
            json!({"topic": "t"}),
            json!({"questions": []}),
            "openai",
        )
        .await
        .unwrap();

        assert_eq!(my_interactions(&pool, student, None).await.unwrap().len(), 10);
        let quizzes = my_interactions(&pool, student, Some("quiz")).await.unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].model_used, "openai");
    }
}
