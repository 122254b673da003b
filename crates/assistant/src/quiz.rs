//! Quiz generation helpers: the prompt sent to the provider chain and the
//! strict parser for the JSON it is asked to return.

use serde::{Deserialize, Serialize};

use crate::AssistantError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u32,
    pub explanation: String,
}

#[derive(Deserialize)]
struct QuizPayload {
    questions: Vec<QuizQuestion>,
}

/// Builds the multiple-choice quiz prompt. The instructions and the inline
/// schema example are in Turkish to match the tutor persona.
pub fn quiz_prompt(topic: &str, difficulty: &str, question_count: u32) -> String {
    format!(
        "\"{topic}\" konusunda {difficulty} seviyesinde {question_count} adet \
         çoktan seçmeli soru oluştur. Her soru için 4 seçenek ver ve doğru \
         cevabın indeksini belirt (0-3). Her soru için kısa bir açıklama ekle.\n\n\
         Sadece JSON formatında yanıt ver:\n\
         {{\"questions\": [{{\"question\": \"Soru metni\", \
         \"options\": [\"A şıkkı\", \"B şıkkı\", \"C şıkkı\", \"D şıkkı\"], \
         \"correct_answer\": 0, \"explanation\": \"Açıklama\"}}]}}"
    )
}

/// Parses a provider reply into typed questions. Models frequently wrap the
/// JSON in a markdown code fence despite the prompt, so fences are stripped
/// before parsing; anything else malformed is an error.
pub fn parse_quiz_response(raw: &str) -> Result<Vec<QuizQuestion>, AssistantError> {
    let payload: QuizPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|err| AssistantError::InvalidResponse(format!("quiz JSON did not parse: {err}")))?;

    if payload.questions.is_empty() {
        return Err(AssistantError::InvalidResponse(
            "quiz reply contained no questions".into(),
        ));
    }

    for question in &payload.questions {
        if question.options.is_empty() || question.correct_answer as usize >= question.options.len()
        {
            return Err(AssistantError::InvalidResponse(format!(
                "correct_answer {} is out of range for {} options",
                question.correct_answer,
                question.options.len()
            )));
        }
    }

    Ok(payload.questions)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
