//! External judge support
//!
//! When local scoring is not confident, the engine can ask an outside judge
//! (usually an LLM) for a verdict. The judge is reached only through the
//! [`ExternalJudge`] trait; [`LlmJudge`] implements it over a sync HTTP
//! client with BYOK (bring your own key) backends.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `OPENROUTER_API_KEY`: Required for the OpenRouter backend
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama
//!
//! # Example
//!
//! ```rust,ignore
//! use clarifier::ai::{ClientConfig, LlmBackend, LlmClient, LlmJudge};
//!
//! let client = LlmClient::from_env(ClientConfig::for_backend(LlmBackend::Anthropic))?;
//! let judge = LlmJudge::new(client);
//! ```

mod client;
mod judge;
pub mod parse;
pub mod prompts;

pub use client::{ClientConfig, LlmBackend, LlmClient};
pub use judge::{compare_prompts, judge_vagueness, ExternalJudge, LlmJudge};
pub use parse::{parse_comparison, parse_judge_response, ComparisonScores, ParsedJudgeResponse};

use std::time::Duration;
use thiserror::Error;

/// Ways a judge call can fail. The engine recovers from all of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JudgeError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    /// Transport failure, HTTP error status or an unusable vendor envelope
    #[error("Judge unavailable: {0}")]
    Unavailable(String),

    /// The judge answered but the answer did not hold a valid verdict
    #[error("Failed to parse judge response: {0}")]
    Parse(String),

    #[error("Judge timed out after {0:?}")]
    Timeout(Duration),

    #[error("Judge call was cancelled")]
    Cancelled,
}

pub type JudgeResult<T> = Result<T, JudgeError>;
