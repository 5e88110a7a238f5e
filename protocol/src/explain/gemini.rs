//! Gemini `generateContent` client.
//!
//! One POST per explanation, no streaming, no retries. The API key travels
//! as the `key` query parameter. Timeouts are whatever `reqwest` defaults
//! to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GeminiConfig;

use super::{ExplainError, TextGenerator};

// ---------------------------------------------------------------------------
// Wire Types
// ---------------------------------------------------------------------------

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateContentRequest {
    /// Role-tagged conversation turns. The demo always sends exactly one.
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// A single user turn carrying `prompt`.
    pub fn user_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Response Shape
// ---------------------------------------------------------------------------

/// Text of the first part of the first candidate.
///
/// Anything else (no candidates, empty parts, non-string text, an error
/// object) is a malformed response and is handed back whole for logging.
pub fn extract_text(response: &Value) -> Result<String, ExplainError> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ExplainError::MalformedResponse(response.clone()))
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// HTTP client for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Use a pre-built `reqwest::Client` (proxies, custom TLS roots).
    pub fn with_client(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// Endpoint URL without the query string.
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Value, ExplainError> {
        let url = self.url();
        let body = GenerateContentRequest::user_prompt(prompt);

        if self.config.api_key.is_empty() {
            warn!("no Gemini API key configured, the request will most likely be refused");
        }
        debug!(%url, model = %self.config.model, prompt_len = prompt.len(), "calling generateContent");

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ExplainError::Transport(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            // Error bodies are still JSON; the shape check downstream
            // turns them into the "could not generate" fallback.
            warn!(%status, "generateContent returned a non-success status");
        }

        resp.json::<Value>()
            .await
            .map_err(|e| ExplainError::Transport(format!("invalid response body: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let body = GenerateContentRequest::user_prompt("hi");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }] })
        );
    }

    #[test]
    fn extract_text_well_formed() {
        let resp = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello" }, { "text": "ignored" }] } }]
        });
        assert_eq!(extract_text(&resp).unwrap(), "Hello");
    }

    #[test]
    fn extract_text_empty_candidates() {
        let resp = json!({ "candidates": [] });
        match extract_text(&resp) {
            Err(ExplainError::MalformedResponse(raw)) => assert_eq!(raw, resp),
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[test]
    fn extract_text_rejects_partial_shapes() {
        for resp in [
            json!({}),
            json!({ "candidates": [{}] }),
            json!({ "candidates": [{ "content": {} }] }),
            json!({ "candidates": [{ "content": { "parts": [] } }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": 7 }] } }] }),
            json!({ "error": { "code": 400, "message": "API key not valid" } }),
        ] {
            assert!(extract_text(&resp).is_err(), "accepted: {}", resp);
        }
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let client = GeminiClient::new(GeminiConfig {
            endpoint: "http://127.0.0.1:9000/v1beta/".into(),
            model: "m".into(),
            api_key: String::new(),
        });
        assert_eq!(client.url(), "http://127.0.0.1:9000/v1beta/models/m:generateContent");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Take a free port from the OS, then close it again.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = GeminiClient::new(GeminiConfig {
            endpoint: format!("http://127.0.0.1:{}", port),
            ..GeminiConfig::default()
        });
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, ExplainError::Transport(_)), "got {:?}", err);
    }
}
