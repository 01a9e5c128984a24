//! Anthropic Messages API backend
//!
//! Speaks the `/v1/messages` wire format: `x-api-key` header auth plus the
//! `anthropic-version` header, system prompt as a top-level field, and the
//! completion text in the first `content` block of the response.

use crate::config::ProviderCredentials;
use crate::providers::{
    classify_status, CompletionBackend, CompletionRequest, ProviderError, ProviderId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Backend for Anthropic's Messages API
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicBackend {
    /// Create a backend from configured credentials
    pub fn new(client: reqwest::Client, credentials: &ProviderCredentials) -> Self {
        Self {
            client,
            api_key: credentials.api_key().to_string(),
            base_url: credentials
                .base_url()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
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
struct ContentBlock {
    text: Option<String>,
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let provider = self.provider();
        let url = format!("{}/v1/messages", self.base_url);

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.user,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable {
                provider,
                reason: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(provider, status));
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider,
                    reason: format!("invalid JSON body: {}", e),
                })?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider,
                reason: "response contained no text content block".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let credentials =
            ProviderCredentials::for_tests("sk-ant-test", Some("http://localhost:9999/"));
        let backend = AnthropicBackend::new(reqwest::Client::new(), &credentials);
        assert_eq!(backend.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_default_base_url_used_without_override() {
        let credentials = ProviderCredentials::for_tests("sk-ant-test", None);
        let backend = AnthropicBackend::new(reqwest::Client::new(), &credentials);
        assert_eq!(backend.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{"content": [{"type": "text", "text": "hello"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("hello"));
    }
}
