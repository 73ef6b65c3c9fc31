pub mod coach;
pub mod motivate;
pub mod stats;

use habitflow_ai::CoachClient;

use crate::config::ClientConfig;

/// Client for the coach functions of the configured project
pub fn coach_client(config: &ClientConfig) -> anyhow::Result<CoachClient> {
    let client = CoachClient::new(config.project_url()?)?;
    Ok(match &config.project.api_key {
        Some(key) => client.with_api_key(key),
        None => client,
    })
}
