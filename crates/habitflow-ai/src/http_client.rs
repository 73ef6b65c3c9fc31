use reqwest::{Client, Response};
use serde::Deserialize;

use crate::error::Result;

const DISABLE_SYSTEM_PROXY_ENV: &str = "HABITFLOW_DISABLE_SYSTEM_PROXY";

// Truncate error bodies to avoid carrying large or sensitive responses around.
const MAX_ERROR_BODY: usize = 512;

pub fn build_http_client() -> Result<Client> {
    if should_disable_system_proxy() {
        Ok(Client::builder().no_proxy().build()?)
    } else {
        Ok(Client::new())
    }
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Read an error response body, preferring the `{"error": ...}` field
pub(crate) async fn error_detail(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
        return parsed.error;
    }

    if body.chars().count() > MAX_ERROR_BODY {
        let truncated: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}... [truncated]", truncated)
    } else {
        body
    }
}
