#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM integration for the `CrimeWatch` backend.
//!
//! Supports Anthropic Claude and `OpenAI` GPT models behind a single
//! [`providers::LlmProvider`] trait, auto-detected from whichever API key
//! is present in the environment. On top of that seam sit three consumers:
//! the [`narrative`] requester that turns an aggregated crime summary into
//! a structured security analysis (with a deterministic fallback when the
//! model is unreachable), the single-turn location [`chatbot`], and the
//! public tourist [`safety`] assistant with its built-in Yogyakarta
//! knowledge base.

pub mod chatbot;
pub mod narrative;
pub mod providers;
pub mod safety;

use thiserror::Error;

/// Maximum accepted question length for the chatbot and safety assistant,
/// in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error (missing API key, etc.)
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}
