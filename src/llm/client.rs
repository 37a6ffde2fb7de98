//! Async HTTP client for the dialogue backend
//!
//! Speaks the Anthropic messages format: `{model, max_tokens, system,
//! messages}` in, `{content: [{type, text}], usage}` out. The client makes
//! exactly one network call per `send`; timeouts and retries belong to the
//! caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ShroomError};
use crate::core::types::ChatMessage;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Text of the first `text` block, falling back to the first block
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.kind == "text")
            .or_else(|| self.content.first())
            .and_then(|b| b.text.as_deref())
    }
}

/// One attempt at generating a line. Implemented by the live client and the mock.
#[async_trait]
pub trait DialogueTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Live backend over HTTP
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
}

impl LlmClient {
    /// Create a client. Without a key no auth headers are sent, for use
    /// behind a proxy that adds them.
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url,
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY, unless LLM_API_URL points at a proxy
    /// Optional: LLM_API_URL (defaults to the Anthropic API)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());
        let api_url = std::env::var("LLM_API_URL").ok();

        match (api_key, api_url) {
            (None, None) => Err(ShroomError::LlmError(
                "LLM_API_KEY not set and no LLM_API_URL proxy given".into(),
            )),
            (key, url) => Ok(Self::new(key, url.unwrap_or_else(|| DEFAULT_API_URL.into()))),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl DialogueTransport for LlmClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut builder = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json");
        if let Some(key) = &self.api_key {
            builder = builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION);
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| ShroomError::LlmError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShroomError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| ShroomError::LlmError(e.to_string()))?;

        if let Some(usage) = completion.usage {
            tracing::debug!(
                "Dialogue usage: {} in / {} out",
                usage.input_tokens,
                usage.output_tokens
            );
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new(Some("test-key".into()), "https://api.example.com".into());
        assert!(client.has_key());
        assert_eq!(client.api_url(), "https://api.example.com");

        let proxied = LlmClient::new(None, "http://localhost:8787/chat".into());
        assert!(!proxied.has_key());
    }

    #[test]
    fn test_request_wire_format() {
        let req = ChatRequest {
            model: "m".into(),
            max_tokens: 150,
            system: "be a mushroom".into(),
            messages: vec![ChatMessage::user("hi")],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["system"], "be a mushroom");
    }

    #[test]
    fn test_response_first_text_block() {
        let raw = r#"{
            "content": [{"type": "thinking"}, {"type": "text", "text": "Hello!"}],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.first_text(), Some("Hello!"));
        assert_eq!(resp.usage.unwrap().output_tokens, 3);
    }

    #[test]
    fn test_response_without_text() {
        let resp: ChatResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(resp.first_text(), None);

        let resp: ChatResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use"}]}"#).unwrap();
        assert_eq!(resp.first_text(), None);
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"choices": []}"#).is_err());
    }
}
