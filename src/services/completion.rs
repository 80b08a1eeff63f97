//! Text completion and embedding against an OpenAI-compatible endpoint.
//!
//! The service is constructed from optional configuration: without it,
//! `is_available` is false and calls return `Unavailable`, so callers can
//! degrade instead of failing at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::ConciergeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptMessage {
    pub role: ChatRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Service trait for chat completion and text embedding.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ConciergeError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ConciergeError>;

    fn is_available(&self) -> bool;
}

#[derive(Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Serialize)]
struct EmbeddingBody {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// OpenAI-compatible HTTP completion service.
pub struct OpenAiCompletionService {
    config: Option<CompletionConfig>,
    http: reqwest::Client,
}

impl OpenAiCompletionService {
    pub fn new(config: Option<CompletionConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn require_config(&self) -> Result<&CompletionConfig, ConciergeError> {
        self.config.as_ref().ok_or_else(|| {
            ConciergeError::Unavailable("completion backend is not configured".to_string())
        })
    }

    fn build_messages(request: &CompletionRequest) -> Vec<WireMessage> {
        request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    #[cfg(test)]
    fn build_chat_body(&self, request: &CompletionRequest) -> ChatCompletionBody {
        let config = self.config.as_ref().unwrap();
        ChatCompletionBody {
            model: config.model.clone(),
            messages: Self::build_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ConciergeError> {
        let config = self.require_config()?;
        let url = format!("{}/v1/chat/completions", config.base_url);
        let body = ChatCompletionBody {
            model: config.model.clone(),
            messages: Self::build_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut http_req = self.http.post(&url).json(&body);
        if let Some(ref key) = config.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ConciergeError::Completion(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ConciergeError::Completion(format!(
                "completion API error {status}: {body_text}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ConciergeError::Completion(format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ConciergeError::Completion("empty choices in response".to_string()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ConciergeError> {
        let config = self.require_config()?;
        let url = format!("{}/v1/embeddings", config.base_url);
        let body = EmbeddingBody {
            model: config.embedding_model.clone(),
            input: text.to_string(),
        };

        let mut http_req = self.http.post(&url).json(&body);
        if let Some(ref key) = config.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ConciergeError::Completion(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ConciergeError::Completion(format!(
                "embedding API error {status}: {body_text}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ConciergeError::Completion(format!("malformed embedding response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ConciergeError::Completion("empty embedding response".to_string()))
    }

    fn is_available(&self) -> bool {
        self.config.is_some()
    }
}
