//! Client for the HabitFlow coach functions

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use habitflow_models::{Message, Motivation, MotivationRequest, UserContext};
use reqwest::Client;
use serde::Serialize;

use crate::error::{AiError, Result};
use crate::http_client::{build_http_client, error_detail};

/// Raw reply body of a coach turn
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Opens the streamed reply for one coach turn
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the conversation so far and return the reply body.
    ///
    /// Does not touch the transcript; the caller owns it.
    async fn open_stream(
        &self,
        access_token: Option<&str>,
        messages: &[Message],
        context: &UserContext,
    ) -> Result<ByteStream>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CoachRequest<'a> {
    messages: &'a [Message],
    user_context: &'a UserContext,
}

/// HTTP client for the `habit-coach` and `generate-motivation` functions
#[derive(Clone)]
pub struct CoachClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoachClient {
    /// Create a client for the functions hosted under `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        })
    }

    /// Project key sent as the `apikey` header
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/functions/v1/habit-coach", self.base_url)
    }

    pub fn motivation_url(&self) -> String {
        format!("{}/functions/v1/generate-motivation", self.base_url)
    }

    fn with_project_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }

    /// Ask for a generated motivation.
    ///
    /// The function answers a failed generation with a 500 that still carries
    /// a fallback motivation; that fallback is returned as a success.
    pub async fn generate_motivation(
        &self,
        access_token: Option<&str>,
        request: &MotivationRequest,
    ) -> Result<Motivation> {
        let bearer = access_token
            .filter(|token| !token.trim().is_empty())
            .or(self.api_key.as_deref())
            .ok_or(AiError::Unauthenticated)?;

        let response = self
            .with_project_key(self.client.post(self.motivation_url()))
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::TransportFailure(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        if status.as_u16() == 500 {
            let body = response.text().await.unwrap_or_default();
            if let Ok(fallback) = serde_json::from_str::<Motivation>(&body) {
                tracing::warn!("Motivation generation failed, using fallback");
                return Ok(fallback);
            }
            return Err(AiError::from_status(500, body));
        }

        Err(AiError::from_status(status.as_u16(), error_detail(response).await))
    }
}

#[async_trait]
impl ChatTransport for CoachClient {
    async fn open_stream(
        &self,
        access_token: Option<&str>,
        messages: &[Message],
        context: &UserContext,
    ) -> Result<ByteStream> {
        let token = access_token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AiError::Unauthenticated)?;

        let body = CoachRequest {
            messages,
            user_context: context,
        };

        let response = self
            .with_project_key(self.client.post(self.chat_url()))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::TransportFailure(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            tracing::warn!(status = status.as_u16(), detail = %detail, "Coach stream rejected");
            return Err(AiError::from_status(status.as_u16(), detail));
        }

        let mut byte_stream = response.bytes_stream();

        // Pull the first non-empty chunk so an empty body fails here rather
        // than as a silent empty reply.
        let first = loop {
            match byte_stream.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => break chunk,
                Some(Err(e)) => {
                    return Err(AiError::TransportFailure(format!("Stream error: {}", e)));
                }
                None => {
                    return Err(AiError::TransportFailure(
                        "Failed to start stream: empty response body".to_string(),
                    ));
                }
            }
        };

        Ok(Box::pin(async_stream::stream! {
            yield Ok(first);
            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => yield Ok(bytes),
                    Err(e) => {
                        yield Err(AiError::TransportFailure(format!("Stream error: {}", e)));
                        return;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let client = CoachClient::new("http://127.0.0.1:9").unwrap();
        let result = client
            .open_stream(None, &[Message::user("hi")], &UserContext::default())
            .await;
        assert!(matches!(result, Err(AiError::Unauthenticated)));

        let result = client
            .open_stream(Some("  "), &[Message::user("hi")], &UserContext::default())
            .await;
        assert!(matches!(result, Err(AiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn streams_body_on_success() {
        let server = MockServer::start().await;
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n";
        Mock::given(method("POST"))
            .and(path("/functions/v1/habit-coach"))
            .and(header("authorization", "Bearer token-1"))
            .and(header("apikey", "anon"))
            .and(body_json(serde_json::json!({
                "messages": [{ "role": "user", "content": "hi" }],
                "userContext": {}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CoachClient::new(server.uri()).unwrap().with_api_key("anon");
        let stream = client
            .open_stream(
                Some("token-1"),
                &[Message::user("hi")],
                &UserContext::default(),
            )
            .await
            .unwrap();

        assert_eq!(collect(stream).await, body.as_bytes());
    }

    #[tokio::test]
    async fn status_codes_map_to_error_taxonomy() {
        let cases = [
            (429, "rate"),
            (402, "quota"),
            (500, "other"),
            (401, "other"),
        ];
        for (status, kind) in cases {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(status)
                        .set_body_json(serde_json::json!({ "error": "nope" })),
                )
                .mount(&server)
                .await;

            let client = CoachClient::new(server.uri()).unwrap();
            let error = client
                .open_stream(Some("t"), &[Message::user("hi")], &UserContext::default())
                .await
                .err()
                .unwrap();

            match kind {
                "rate" => assert!(matches!(error, AiError::RateLimited(ref d) if d == "nope")),
                "quota" => assert!(matches!(error, AiError::ServiceUnavailable(_))),
                _ => assert!(matches!(error, AiError::TransportFailure(_))),
            }
        }
    }

    #[tokio::test]
    async fn empty_success_body_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = CoachClient::new(server.uri()).unwrap();
        let result = client
            .open_stream(Some("t"), &[Message::user("hi")], &UserContext::default())
            .await;
        assert!(matches!(result, Err(AiError::TransportFailure(_))));
    }

    #[tokio::test]
    async fn motivation_success_and_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/generate-motivation"))
            .and(header("authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "AI service error",
                "motivation": "Keep building those habits! Every small step counts.",
                "tips": ["Start with just 2 minutes", "Stack habits together", "Track your progress"],
                "encouragement": "You're doing great!"
            })))
            .mount(&server)
            .await;

        let client = CoachClient::new(server.uri()).unwrap().with_api_key("anon");
        let motivation = client
            .generate_motivation(None, &MotivationRequest::default())
            .await
            .unwrap();
        assert_eq!(motivation, Motivation::fallback());
    }

    #[tokio::test]
    async fn motivation_rate_limit_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({ "error": "Rate limit exceeded." })),
            )
            .mount(&server)
            .await;

        let client = CoachClient::new(server.uri()).unwrap();
        let result = client
            .generate_motivation(Some("jwt"), &MotivationRequest::default())
            .await;
        assert!(matches!(result, Err(AiError::RateLimited(_))));
    }
}
