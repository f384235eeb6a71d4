use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ChatRequest, ChatResponse, ErrorResponse, Message};
use crate::config::{ApiKey, LlmSettings};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("response contained no choices")]
    NoChoices,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One chat-completion round trip returning the first choice's text.
/// Implemented by `ChatClient` for production; mock implementations used in tests.
pub trait ChatCompletion {
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError>;
}

#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(http: Client, settings: LlmSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model,
            max_tokens: settings.max_tokens,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: base_url.to_string(),
            model: crate::config::DEFAULT_MODEL.to_string(),
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChatCompletion for ChatClient {
    async fn complete(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest::deterministic(&self.model, self.max_tokens, messages);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("chat API rate limited");
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(body) => body.error.message.unwrap_or_else(|| "Unknown error".to_string()),
                Err(_) => {
                    let snippet: String = text.chars().take(200).collect();
                    format!("HTTP {status}: {snippet}")
                }
            };
            return Err(LlmError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        let choice = body.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
        debug!(model = %self.model, "chat completion received");

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}
