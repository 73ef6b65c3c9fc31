use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use habitflow_ai::gateway::{DEFAULT_GATEWAY_MODEL, DEFAULT_GATEWAY_URL};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub gateway_url: String,
    pub gateway_model: String,
    pub gateway_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    gateway: GatewaySection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewaySection {
    #[serde(default = "default_gateway_url")]
    url: String,
    #[serde(default = "default_gateway_model")]
    model: String,
    #[serde(default)]
    api_key: Option<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            model: default_gateway_model(),
            api_key: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_gateway_model() -> String {
    DEFAULT_GATEWAY_MODEL.to_string()
}

fn gateway_key_from_env() -> Option<String> {
    env::var("AI_GATEWAY_API_KEY")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_file(file_config));
        }

        Ok(Self::from_env())
    }

    fn from_file(file_config: FileConfig) -> Self {
        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            gateway_url: file_config.gateway.url,
            gateway_model: file_config.gateway.model,
            // Keys usually stay out of the file
            gateway_api_key: file_config.gateway.api_key.or_else(gateway_key_from_env),
        }
    }

    fn from_env() -> Self {
        let host = env::var("HABITFLOW_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("HABITFLOW_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let gateway_url = env::var("AI_GATEWAY_URL").unwrap_or_else(|_| default_gateway_url());
        let gateway_model =
            env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| default_gateway_model());

        Self {
            host,
            port,
            gateway_url,
            gateway_model,
            gateway_api_key: gateway_key_from_env(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("HABITFLOW_SERVER_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("server.toml").exists() {
        Some("server.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    parse_file(&path).map(Some)
}

fn parse_file(path: &str) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))
}
