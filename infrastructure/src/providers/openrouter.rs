//! OpenRouter backend client
//!
//! Implements the [`BackendClient`] port against the OpenRouter chat
//! completions API. One shared `reqwest` client serves every backend on the
//! panel; the model identifier travels in the request payload.

use arena_application::{BackendClient, BackendClientError, BackendReply};
use arena_domain::BackendId;
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REFERER: &str = "https://localhost:5000";
const TITLE: &str = "Model Arena";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.7;

/// Construction-time failures
#[derive(Error, Debug)]
pub enum OpenRouterError {
    #[error("OpenRouter API key is not configured")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// OpenRouter API client, shared by all dispatchers
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    /// Create a client; an absent or empty key fails here rather than on
    /// every call
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenRouterError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OpenRouterError::MissingApiKey);
        }
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl BackendClient for OpenRouterClient {
    async fn send(
        &self,
        backend: &BackendId,
        prompt: &str,
    ) -> Result<BackendReply, BackendClientError> {
        let payload = json!({
            "model": backend.as_str(),
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        debug!(model = %backend, "sending chat completion request");
        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, message));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendClientError::Network(e.to_string()))?;

        let content = extract_content(&body).unwrap_or_default();
        if content.is_empty() {
            warn!(model = %backend, "no content found in response");
        }
        Ok(BackendReply::new(content))
    }
}

fn classify_transport_error(error: reqwest::Error) -> BackendClientError {
    if error.is_timeout() {
        BackendClientError::Timeout
    } else {
        BackendClientError::Network(error.to_string())
    }
}

/// Map a non-200 status to the port's failure taxonomy
fn classify_status(status: u16, message: String) -> BackendClientError {
    if status == 429 {
        BackendClientError::RateLimited
    } else {
        BackendClientError::Backend { status, message }
    }
}

/// Pull the response text out of a chat completion body.
///
/// OpenRouter models are not uniform: most return
/// `choices[0].message.content`, some `choices[0].text`, a few
/// `choices[0].content`.
fn extract_content(body: &Value) -> Option<String> {
    let choice = body.get("choices")?.get(0)?;
    choice
        .pointer("/message/content")
        .or_else(|| choice.get("text"))
        .or_else(|| choice.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected_at_construction() {
        assert!(matches!(OpenRouterClient::new(""), Err(OpenRouterError::MissingApiKey)));
        assert!(matches!(OpenRouterClient::new("  "), Err(OpenRouterError::MissingApiKey)));
        assert!(OpenRouterClient::new("sk-or-test").is_ok());
    }

    #[test]
    fn test_extract_content_message_shape() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "hello there"}}]
        });
        assert_eq!(extract_content(&body).as_deref(), Some("hello there"));
    }

    #[test]
    fn test_extract_content_text_fallback() {
        let body = json!({"choices": [{"text": "plain completion"}]});
        assert_eq!(extract_content(&body).as_deref(), Some("plain completion"));
    }

    #[test]
    fn test_extract_content_bare_content_fallback() {
        let body = json!({"choices": [{"content": "bare"}]});
        assert_eq!(extract_content(&body).as_deref(), Some("bare"));
    }

    #[test]
    fn test_extract_content_missing() {
        assert_eq!(extract_content(&json!({})), None);
        assert_eq!(extract_content(&json!({"choices": []})), None);
        assert_eq!(extract_content(&json!({"choices": [{"message": {}}]})), None);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(classify_status(429, String::new()), BackendClientError::RateLimited));

        let auth = classify_status(401, "bad key".to_string());
        assert!(auth.is_client_fault());
        assert!(!auth.is_retryable());

        let unavailable = classify_status(502, String::new());
        assert!(unavailable.is_retryable());
    }
}
