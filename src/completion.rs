//! Text completion over the Anthropic Messages API.

use async_trait::async_trait;
use itertools::Itertools as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub type Result<T> = std::result::Result<T, CompletionError>;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Unexpected response body
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A model that turns a prompt into free-form text.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl MessagesResponse {
    fn into_text(self) -> Option<String> {
        let mut texts = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .peekable();
        texts.peek()?;
        Some(texts.join(""))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => format!("{} - {}", response.error.kind, response.error.message),
        Err(_) => body.to_string(),
    }
}

#[derive(Clone)]
pub struct AnthropicClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            model: model.into(),
        }
    }

    /// Expects the key to have passed [`Config::check_credentials`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_key.trim(), &config.model).with_base_url(&config.api_base_url)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completion for AnthropicClient {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let start = std::time::Instant::now();
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: max_output_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Completion request failed");
                CompletionError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;
        if !status.is_success() {
            let message = error_message(&body);
            warn!(status = %status, error = %message, "Completion API error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = serde_json::from_str::<MessagesResponse>(&body)
            .map_err(|e| CompletionError::Parse(e.to_string()))?
            .into_text()
            .ok_or_else(|| CompletionError::Parse("response has no text content".into()))?;

        debug!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_len = text.len(),
            "Completion finished"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let request = MessagesRequest {
            model: "claude-haiku-4-5-20251001",
            max_tokens: 2000,
            messages: [Message {
                role: "user",
                content: "hello",
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "claude-haiku-4-5-20251001",
                "max_tokens": 2000,
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn text_blocks_are_joined() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "text", "text": "Here you go:\n" },
                    { "type": "thinking", "thinking": "..." },
                    { "type": "text", "text": "[]" }
                ],
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Here you go:\n[]"));
    }

    #[test]
    fn response_without_text_has_none() {
        let response: MessagesResponse = serde_json::from_str(r#"{ "content": [] }"#).unwrap();
        assert_eq!(response.into_text(), None);
    }

    #[test]
    fn api_error_message() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(
            error_message(body),
            "authentication_error - invalid x-api-key"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn client_from_config() {
        use clap::Parser as _;

        let config = Config::parse_from([
            "trip-flights",
            "--api-key",
            " sk-ant-123 ",
            "--model",
            "claude-sonnet-4-5",
            "--api-base-url",
            "http://localhost:8080/",
        ]);
        let client = AnthropicClient::from_config(&config);
        assert_eq!(client.api_key, "sk-ant-123");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.model(), "claude-sonnet-4-5");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = AnthropicClient::new("key", "model").with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.model(), "model");
    }
}
