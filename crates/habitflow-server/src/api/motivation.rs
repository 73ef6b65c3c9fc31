//! `generate-motivation` function

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use habitflow_ai::{AiError, motivation_messages, parse_motivation};
use habitflow_models::{Motivation, MotivationRequest};
use serde::Serialize;

use super::response::error_response;
use super::state::AppState;

#[derive(Serialize)]
struct MotivationFailure {
    error: String,
    #[serde(flatten)]
    motivation: Motivation,
}

fn failure(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MotivationFailure {
            error: message.into(),
            motivation: Motivation::fallback(),
        }),
    )
        .into_response()
}

pub async fn generate_motivation(State(state): State<AppState>, body: Bytes) -> Response {
    let request: MotivationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return failure(format!("Invalid request body: {}", err)),
    };

    let gateway = match state.gateway() {
        Ok(gateway) => gateway,
        Err(error) => {
            tracing::error!(error = %error, "Error in generate-motivation");
            return failure(error.to_string());
        }
    };

    match gateway.complete(&motivation_messages(&request)).await {
        Ok(content) => Json(parse_motivation(&content)).into_response(),
        Err(error) => match error.status() {
            Some(429) => error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again later.",
            ),
            Some(402) => error_response(
                StatusCode::PAYMENT_REQUIRED,
                "Usage limit reached. Please add credits.",
            ),
            _ => {
                tracing::error!(error = %error, "Error in generate-motivation");
                let message = match error {
                    AiError::Gateway { .. } => "AI service error".to_string(),
                    other => other.to_string(),
                };
                failure(message)
            }
        },
    }
}
