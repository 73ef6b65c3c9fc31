//! Error types for the coach client and gateway

use thiserror::Error;

/// Shown whenever a turn fails for a reason the user cannot act on
pub const APOLOGY_MESSAGE: &str =
    "I'm having trouble connecting right now. Please try again in a moment! 💜";

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("No access credential available")]
    Unauthenticated,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Gateway error (HTTP {status}): {message}")]
    Gateway { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// Map a non-success status from a coach function to the client taxonomy
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            429 => AiError::RateLimited(detail),
            402 => AiError::ServiceUnavailable(detail),
            _ => AiError::TransportFailure(format!("HTTP {}: {}", status, detail)),
        }
    }

    /// Text placed in the transcript when a turn fails with this error
    pub fn user_message(&self) -> &'static str {
        match self {
            AiError::Unauthenticated => "Please log in to use the AI coach.",
            AiError::RateLimited(_) => "Rate limited. Please try again in a moment.",
            AiError::ServiceUnavailable(_) => "Service temporarily unavailable.",
            _ => APOLOGY_MESSAGE,
        }
    }

    /// HTTP status reported by the remote side, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Gateway { status, .. } => Some(*status),
            AiError::RateLimited(_) => Some(429),
            AiError::ServiceUnavailable(_) => Some(402),
            AiError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert!(matches!(
            AiError::from_status(429, "slow down"),
            AiError::RateLimited(detail) if detail == "slow down"
        ));
        assert!(matches!(
            AiError::from_status(402, "pay"),
            AiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            AiError::from_status(500, "boom"),
            AiError::TransportFailure(detail) if detail == "HTTP 500: boom"
        ));
    }

    #[test]
    fn user_messages() {
        assert_eq!(
            AiError::RateLimited(String::new()).user_message(),
            "Rate limited. Please try again in a moment."
        );
        assert_eq!(
            AiError::ServiceUnavailable(String::new()).user_message(),
            "Service temporarily unavailable."
        );
        assert_eq!(
            AiError::Unauthenticated.user_message(),
            "Please log in to use the AI coach."
        );
        assert_eq!(
            AiError::TransportFailure("x".into()).user_message(),
            APOLOGY_MESSAGE
        );
    }
}
