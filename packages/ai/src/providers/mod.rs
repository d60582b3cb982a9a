//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude and `OpenAI` via a common trait.

pub mod anthropic;
pub mod openai;

use std::time::Duration;

use crate::AiError;

/// Default per-request timeout when `LLM_TIMEOUT_SECONDS` is not set.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// A single-turn completion request.
///
/// Every consumer in this crate speaks this shape; the providers translate
/// it into their native wire formats.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt establishing the model's role and context.
    pub system_prompt: String,
    /// The user-facing prompt or question.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Ask the model to respond with a single JSON object.
    pub json_response: bool,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a completion request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the response carries
    /// no text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}

/// Creates an LLM provider based on environment variables.
///
/// Auto-detects from available credentials:
///
/// 1. `ANTHROPIC_API_KEY` set -> Anthropic Claude (model from
///    `ANTHROPIC_MODEL`, default `claude-sonnet-4-20250514`)
/// 2. `OPENAI_API_KEY` set -> `OpenAI` (model from `OPENAI_MODEL`,
///    default `gpt-4o`)
///
/// Requests time out after `LLM_TIMEOUT_SECONDS` seconds (default 30).
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let timeout = request_timeout_from_env();

    if let Ok(api_key) = std::env::var("ANTHROPIC_API_KEY") {
        log::info!("Auto-detected LLM provider: Anthropic (ANTHROPIC_API_KEY found)");
        let model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());
        return Ok(Box::new(anthropic::AnthropicProvider::new(
            api_key, model, timeout,
        )));
    }

    if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
        log::info!("Auto-detected LLM provider: OpenAI (OPENAI_API_KEY found)");
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        return Ok(Box::new(openai::OpenAiProvider::new(
            api_key, model, timeout,
        )));
    }

    Err(AiError::Config {
        message: "No LLM credentials detected. Set ANTHROPIC_API_KEY or OPENAI_API_KEY."
            .to_string(),
    })
}

fn request_timeout_from_env() -> Duration {
    let seconds = std::env::var("LLM_TIMEOUT_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    Duration::from_secs(seconds)
}
