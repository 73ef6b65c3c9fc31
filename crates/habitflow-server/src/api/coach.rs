//! `habit-coach` function: streams a coach reply from the gateway

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use habitflow_ai::{AiError, coach_system_prompt};
use habitflow_models::{Message, UserContext};
use serde::Deserialize;

use super::bearer_token;
use super::response::error_response;
use super::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

fn gateway_error_response(error: AiError) -> Response {
    match error.status() {
        Some(429) => error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limits exceeded, please try again later.",
        ),
        Some(402) => error_response(
            StatusCode::PAYMENT_REQUIRED,
            "Payment required, please add funds.",
        ),
        _ if matches!(error, AiError::Gateway { .. }) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "AI gateway error")
        }
        _ => {
            tracing::error!(error = %error, "habit-coach error");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

pub async fn habit_coach(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if bearer_token(&headers).is_none() {
        return error_response(StatusCode::UNAUTHORIZED, "Missing authorization header");
    }

    let request: CoachRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", err),
            );
        }
    };

    let gateway = match state.gateway() {
        Ok(gateway) => gateway,
        Err(error) => return gateway_error_response(error),
    };

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(Message::system(coach_system_prompt(
        request.user_context.as_ref(),
    )));
    messages.extend(request.messages);

    tracing::debug!(
        turns = messages.len() - 1,
        model = gateway.model(),
        "Forwarding coach conversation"
    );

    match gateway.stream_chat(&messages).await {
        Ok(upstream) => (
            [(header::CONTENT_TYPE, "text/event-stream")],
            Body::from_stream(upstream.bytes_stream()),
        )
            .into_response(),
        Err(error) => gateway_error_response(error),
    }
}
