//! OpenAI-compatible language model gateway used by the coach functions

use habitflow_models::Message;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::{build_http_client, error_detail};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_GATEWAY_MODEL: &str = "google/gemini-2.5-flash";

/// Gateway client
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key: api_key.into(),
            model: DEFAULT_GATEWAY_MODEL.to_string(),
            base_url: DEFAULT_GATEWAY_URL.to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, messages: &[Message], stream: bool) -> Result<Response> {
        let body = GatewayRequest {
            model: &self.model,
            messages,
            stream: stream.then_some(true),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let message = error_detail(response).await;
        tracing::error!(status, message = %message, "AI gateway error");
        Err(AiError::Gateway { status, message })
    }

    /// Start a streamed completion and hand back the raw response.
    ///
    /// The body is the gateway's server-sent-event stream, left unread.
    pub async fn stream_chat(&self, messages: &[Message]) -> Result<Response> {
        self.post(messages, true).await
    }

    /// Run a single completion and return the assistant text
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let response = self.post(messages, false).await?;
        let data: GatewayResponse = response.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::InvalidResponse("No content in gateway response".to_string()))
    }
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    choices: Vec<GatewayChoice>,
}

#[derive(Deserialize)]
struct GatewayChoice {
    message: GatewayMessage,
}

#[derive(Deserialize)]
struct GatewayMessage {
    content: Option<String>,
}
