//! Chat-completion request/response types and the API client.
//!
//! Every image becomes exactly one request: a single `user` message whose
//! content is a text part (the instruction) followed by an `image_url` part
//! carrying the image as a data URI. [`VisionClient`] is the seam between the
//! pipelines and the network; [`OpenAiClient`] is the reqwest-backed
//! implementation.
//!
//! There is no retry, backoff or timeout override here. A transport failure or
//! a non-2xx status is returned to the caller, which decides whether the run
//! stops (`pdf2html`) or the error is reported (`img2tei`).

use crate::config::ApiConfig;
use crate::credentials::ApiKey;
use crate::error::MarkupError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Request ──────────────────────────────────────────────────────────────

/// Body of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Build the single-turn request for one image.
pub fn build_vision_request(prompt: &str, image: &EncodedImage, api: &ApiConfig) -> ChatRequest {
    ChatRequest {
        model: api.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_uri(),
                    },
                },
            ],
        }],
        max_tokens: api.max_tokens,
    }
}

// ── Response ─────────────────────────────────────────────────────────────

/// The parts of a chat-completion response this crate reads. Unknown fields
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// A response with one choice holding `content`. Handy for test doubles.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(content.into()),
                },
            }],
            usage: None,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// Sends one chat-completion request and returns the parsed response.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, MarkupError>;
}

/// HTTPS client for an OpenAI-style `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    /// Construct once per process and pass it to the pipeline functions.
    pub fn new(api_key: ApiKey, endpoint: impl Into<String>) -> Result<Self, MarkupError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| MarkupError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http_client(http, api_key, endpoint))
    }

    /// Reuse a pre-configured reqwest client (proxy, TLS roots, user agent).
    pub fn with_http_client(
        http: reqwest::Client,
        api_key: ApiKey,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl VisionClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, MarkupError> {
        debug!("POST {} (model {})", self.endpoint, request.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|source| MarkupError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| MarkupError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(MarkupError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| MarkupError::MalformedResponse(e.to_string()))?;
        debug!(
            "Response: {} choices, usage {:?}",
            parsed.choices.len(),
            parsed.usage
        );
        Ok(parsed)
    }
}
