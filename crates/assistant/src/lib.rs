//! AI tutor integration for the Campus backend.
//!
//! The tutor speaks through an ordered chain of [`ChatProvider`] adapters.
//! Each adapter wraps one upstream wire format (Gemini `generateContent` or
//! an OpenAI-compatible `chat/completions` endpoint). A request walks the
//! chain in order and returns the first successful completion; adapter
//! failures are logged and swallowed so a flaky upstream never takes the
//! feature down while another provider is healthy.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use campus_config::AssistantConfig;

mod gemini;
mod openai;
pub mod plan;
pub mod quiz;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use plan::{build_study_plan, StudyPlan, StudyPlanOutcome, WeekPlan, STUDY_PLAN_MODEL};
pub use quiz::{parse_quiz_response, quiz_prompt, QuizQuestion};

/// System prompt for the general-purpose tutor chat. The platform serves a
/// Turkish audience, so the persona answers in Turkish.
pub const TUTOR_SYSTEM_PROMPT: &str = "Sen bir eğitim platformu asistanısın. \
Öğrencilere kurslar, öğrenme stratejileri ve genel eğitim konularında yardım \
ediyorsun. Türkçe yanıt ver ve yararlı, destekleyici ol.";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no assistant providers are configured")]
    NotConfigured,
    #[error("all assistant providers failed: {0}")]
    AllProvidersFailed(String),
    #[error("assistant http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// One completion request. `system` is prepended as persona/context in
/// whatever shape the upstream expects.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub message: String,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            system: None,
            message: message.into(),
            max_tokens: 500,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A completed request together with the provider that answered it. The
/// provider name is persisted in the interaction log.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub text: String,
    pub model_used: String,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Stable identifier recorded as `model_used` in the interaction log.
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<String, AssistantError>;
}

/// The ordered provider chain. Providers are tried front to back.
pub struct Assistant {
    providers: Vec<Arc<dyn ChatProvider>>,
}

impl Assistant {
    pub fn new(providers: Vec<Arc<dyn ChatProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Runs the request against each provider in order and returns the first
    /// success. Individual failures are logged; if every provider fails the
    /// error aggregates all of them.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatOutcome, AssistantError> {
        if self.providers.is_empty() {
            return Err(AssistantError::NotConfigured);
        }

        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.complete(request).await {
                Ok(text) => {
                    return Ok(ChatOutcome {
                        text,
                        model_used: provider.name().to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        error = %err,
                        "assistant provider failed, trying next"
                    );
                    failures.push(format!("{}: {err}", provider.name()));
                }
            }
        }

        Err(AssistantError::AllProvidersFailed(failures.join("; ")))
    }
}

/// Builds the provider chain from configuration. Gemini is preferred when
/// both providers carry keys; an empty chain is valid and reports
/// [`AssistantError::NotConfigured`] on use.
pub fn from_config(config: &AssistantConfig) -> Result<Assistant, AssistantError> {
    let mut providers: Vec<Arc<dyn ChatProvider>> = Vec::new();

    if let Some(api_key) = &config.gemini.api_key {
        providers.push(Arc::new(GeminiProvider::new(
            &config.gemini.base_url,
            api_key,
            &config.gemini.model,
            config.request_timeout_seconds,
        )?));
        info!(model = %config.gemini.model, "assistant provider enabled: gemini");
    }

    if let Some(api_key) = &config.openai.api_key {
        providers.push(Arc::new(OpenAiProvider::new(
            &config.openai.base_url,
            api_key,
            &config.openai.model,
            config.request_timeout_seconds,
        )?));
        info!(model = %config.openai.model, "assistant provider enabled: openai");
    }

    if providers.is_empty() {
        info!("no assistant providers configured; tutor endpoints will refuse requests");
    }

    Ok(Assistant::new(providers))
}
