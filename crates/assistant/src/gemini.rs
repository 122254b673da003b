use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{AssistantError, ChatProvider, ChatRequest};

/// Adapter for the Gemini `generateContent` API. Gemini has no separate
/// system role on this endpoint, so the system text is folded into the
/// prompt body.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        request_timeout_seconds: u64,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn render_prompt(request: &ChatRequest) -> String {
        match &request.system {
            Some(system) => format!("{system}\n\n{}", request.message),
            None => request.message.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AssistantError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "parts": [{ "text": Self::render_prompt(request) }]
            }],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": 0.7
            }
        });

        debug!(model = %self.model, "requesting gemini completion");

        let response: GenerateContentResponse = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                AssistantError::InvalidResponse("gemini response carried no candidates".into())
            })?;

        Ok(text)
    }
}
