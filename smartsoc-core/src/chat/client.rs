//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::transcript::ChatTurn;
use crate::config::ChatConfig;
use crate::error::ChatError;

/// Shown when the service rejects a request without a usable message.
pub const DEFAULT_SERVICE_ERROR: &str = "The AI service returned an error. Please try again.";

/// A chat-completions collaborator.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the full conversation and return the reply text. An empty string
    /// means the service answered without content.
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, ChatError>;
}

/// Client for any endpoint speaking the OpenAI `/chat/completions` protocol.
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatClient {
    /// Create a client, resolving the API key from the config or its env var.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| ChatError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::new_with_key(config, api_key)
    }

    pub fn new_with_key(config: &ChatConfig, api_key: String) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Transport {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, messages: &[ChatTurn]) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

/// Reply text from `choices[0].message.content`, or empty when absent.
pub fn parse_reply(body: &Value) -> String {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Display text for a non-success response: `error.message` from a JSON body,
/// otherwise the raw body when it is not JSON, otherwise a fixed message.
pub fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SERVICE_ERROR)
            .to_string(),
        Err(_) if !body.trim().is_empty() => body.to_string(),
        Err(_) => DEFAULT_SERVICE_ERROR.to_string(),
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, ChatError> {
        let url = self.endpoint();
        debug!(url = %url, model = %self.model, turns = messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| ChatError::Transport {
                message: format!("Request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ChatError::Transport {
            message: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(ChatError::Http {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| ChatError::ResponseParse {
            message: format!("Invalid JSON: {e}"),
        })?;
        Ok(parse_reply(&json))
    }
}
