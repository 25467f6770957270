//! LLM adapter for chat completions.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint; the default
//! configuration points at Groq.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::models::ModelId;
use crate::types::{Message, MessageRole};

/// A `(role, content)` pair as sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: ModelId,
    pub messages: Vec<ChatMessage>,
    /// Provider default when unset
    pub temperature: Option<f32>,
}

/// Chat-completion provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run one completion and return the text of the first choice
    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String>;
}

/// LLM adapter that handles API calls
#[derive(Clone)]
pub struct LlmAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from the chat configuration
    pub fn from_config(config: &ChatConfig) -> ChatResult<Self> {
        let api_key = config
            .credentials
            .groq_api_key
            .clone()
            .ok_or(ChatError::LlmNotConfigured)?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            client,
        })
    }

    /// Full URL of the completions endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for LlmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAdapter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatCompletion for LlmAdapter {
    async fn complete(&self, request: &CompletionRequest) -> ChatResult<String> {
        let body = OpenAIRequest::from(request);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        // No retries: a failed call surfaces the turn unanswered
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "chat completion rejected");
            return Err(ChatError::Upstream(format!("API error {}: {}", status, body)));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to parse response: {}", e)))?;

        result.first_content()
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl From<&CompletionRequest> for OpenAIRequest {
    fn from(request: &CompletionRequest) -> Self {
        Self {
            model: request.model.as_str().to_string(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

impl OpenAIResponse {
    fn first_content(self) -> ChatResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ChatError::Upstream("No content in completion response".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn test_from_config_requires_key() {
        let config = ChatConfig::default();
        assert!(matches!(
            LlmAdapter::from_config(&config),
            Err(ChatError::LlmNotConfigured)
        ));

        let config = ChatConfig {
            credentials: Credentials {
                groq_api_key: Some("gsk-test".to_string()),
                ..Credentials::default()
            },
            ..ChatConfig::default()
        };
        let adapter = LlmAdapter::from_config(&config).unwrap();
        assert_eq!(
            adapter.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert!(!format!("{:?}", adapter).contains("gsk-test"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let adapter = LlmAdapter::new("http://localhost:8080/v1/", "key");
        assert_eq!(adapter.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest {
            model: ModelId::Gemma2_9bIt,
            messages: vec![
                ChatMessage::new(MessageRole::System, "Eres un asistente."),
                ChatMessage::new(MessageRole::User, "¿Qué es un flush?"),
            ],
            temperature: None,
        };

        let json = serde_json::to_value(OpenAIRequest::from(&request)).unwrap();
        assert_eq!(json["model"], "gemma2-9b-it");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "¿Qué es un flush?");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Cinco cartas del mismo palo."}}]}"#;
        let response: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_content().unwrap(), "Cinco cartas del mismo palo.");

        let empty: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.first_content().unwrap_err().is_upstream());
    }
}
