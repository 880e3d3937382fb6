pub mod openai;

pub use openai::{OpenAi, OpenAiConfig};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::Prompt;

/// Completion backend trait for LLM providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Human-readable name for this backend.
    fn name(&self) -> &str;

    /// Model identifier requested from the provider.
    fn model(&self) -> &str;

    /// Send the prompt and return the trimmed text of the first choice.
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;
}

/// Anything that went wrong talking to the provider. The HTTP layer treats
/// every variant the same; the detail only reaches the log.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request to completion API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion API did not answer within {0:?}")]
    Timeout(Duration),

    #[error("completion API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("completion response contained no choices")]
    NoChoices,

    #[error("invalid completion API URL: {0}")]
    InvalidUrl(String),
}
