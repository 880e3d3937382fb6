use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{CompletionClient, CompletionError};
use crate::prompt::{ChatMessage, Prompt};

const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// Longest slice of an error body kept for the log.
const MAX_ERROR_BODY: usize = 512;

/// OpenAI backend configuration.
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAi {
    http_client: reqwest::Client,
    url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [&'a ChatMessage; 2],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAi {
    pub fn new(config: OpenAiConfig, http_client: reqwest::Client) -> Result<Self, CompletionError> {
        Ok(Self {
            http_client,
            url: completions_url(&config.base_url)?,
            api_key: config.api_key,
            model: config.model,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn send(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: prompt.messages(),
            max_tokens: self.max_tokens,
        };

        let resp = self
            .http_client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY).to_string(),
            });
        }

        parse_completion(&text)
    }
}

#[async_trait]
impl CompletionClient for OpenAi {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        debug!(model = %self.model, url = %self.url, "sending completion request");
        match tokio::time::timeout(self.timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        }
    }
}

/// Join the chat completions path onto the provider base URL, keeping any
/// base path (e.g. a proxy mounted under "/api").
pub fn completions_url(base_url: &str) -> Result<Url, CompletionError> {
    let mut url = Url::parse(base_url).map_err(|e| CompletionError::InvalidUrl(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(CompletionError::InvalidUrl(base_url.to_string()));
    }
    let base_path = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base_path}/{CHAT_COMPLETIONS_PATH}"));
    url.set_query(None);
    Ok(url)
}

/// Extract the trimmed content of the first choice.
pub fn parse_completion(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::Malformed(e.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::NoChoices)?;
    let content = choice
        .message
        .content
        .ok_or_else(|| CompletionError::Malformed("first choice has no content".into()))?;
    Ok(content.trim().to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
