//! Client configuration file support
//!
//! Loads configuration from ~/.config/habitflow/config.toml. `HABITFLOW_*`
//! environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use habitflow_core::AuthSession;

/// Client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Hosted project settings
    #[serde(default)]
    pub project: ProjectConfig,
    /// Signed-in user
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Base URL hosting `/functions/v1` and `/rest/v1`
    pub url: Option<String>,
    /// Public project key, sent as `apikey`
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

const ENV_OVERRIDES: [&str; 4] = [
    "HABITFLOW_URL",
    "HABITFLOW_API_KEY",
    "HABITFLOW_ACCESS_TOKEN",
    "HABITFLOW_USER_ID",
];

impl ClientConfig {
    /// Load configuration from `path` or the default location, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        Self::load_from_path(path).with_overrides(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "Ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("habitflow").join("config.toml"))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for key in ENV_OVERRIDES {
            let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let slot = match key {
                "HABITFLOW_URL" => &mut self.project.url,
                "HABITFLOW_API_KEY" => &mut self.project.api_key,
                "HABITFLOW_ACCESS_TOKEN" => &mut self.auth.access_token,
                _ => &mut self.auth.user_id,
            };
            *slot = Some(value);
        }
        self
    }

    pub fn project_url(&self) -> anyhow::Result<&str> {
        self.project.url.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No project URL configured. Set [project] url or HABITFLOW_URL")
        })
    }

    /// Signed-in user, when an access token is known. Without a user id the
    /// coach still answers but nothing is saved.
    pub fn auth_session(&self) -> Option<AuthSession> {
        let token = self.auth.access_token.as_ref()?;
        Some(match &self.auth.user_id {
            Some(user_id) => AuthSession::new(token, user_id),
            None => AuthSession::token_only(token),
        })
    }
}
