//! OpenAI Chat Completions backend
//!
//! Speaks the `/v1/chat/completions` wire format: bearer token auth, system
//! prompt as the first chat message, and the completion text in the first
//! choice's message content.

use crate::config::ProviderCredentials;
use crate::providers::{
    classify_status, CompletionBackend, CompletionRequest, ProviderError, ProviderId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Backend for OpenAI's Chat Completions API
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
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
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let provider = self.provider();
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider,
                    reason: format!("invalid JSON body: {}", e),
                })?;

        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider,
                reason: "response contained no completion content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let credentials = ProviderCredentials::for_tests("sk-test", Some("http://localhost:9999/"));
        let backend = OpenAiBackend::new(reqwest::Client::new(), &credentials);
        assert_eq!(backend.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_response_content_extraction() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "hi"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_null_content_is_none() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
