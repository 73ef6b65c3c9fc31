use habitflow_ai::{AiError, GatewayClient};
use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared by all function handlers
pub struct CoachService {
    gateway: Option<GatewayClient>,
}

impl CoachService {
    pub fn new(gateway: Option<GatewayClient>) -> Self {
        Self { gateway }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, AiError> {
        let gateway = match &config.gateway_api_key {
            Some(key) => Some(
                GatewayClient::new(key.clone())?
                    .with_base_url(config.gateway_url.clone())
                    .with_model(config.gateway_model.clone()),
            ),
            None => {
                tracing::warn!("AI_GATEWAY_API_KEY is not set; coach functions will fail");
                None
            }
        };
        Ok(Self::new(gateway))
    }

    pub fn gateway(&self) -> Result<&GatewayClient, AiError> {
        self.gateway
            .as_ref()
            .ok_or_else(|| AiError::Config("AI_GATEWAY_API_KEY is not configured".to_string()))
    }
}

pub type AppState = Arc<CoachService>;
