//! Configuration loading from gangway.toml.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Decision-function settings.
    #[serde(default)]
    pub decider: DeciderConfig,
}

/// HTTP server settings.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Deadline for each correlated tool-server request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Decision-function settings.
#[derive(Debug, Deserialize)]
pub struct DeciderConfig {
    /// Gemini model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API key. Falls back to the GEMINI_API_KEY environment
    /// variable when unset.
    pub api_key: Option<String>,
}

impl Default for DeciderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the decider API key from config or environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.decider.api_key {
            return Ok(key.clone());
        }
        std::env::var("GEMINI_API_KEY").map_err(|_| ConfigError::MissingApiKey)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("decider API key not configured: set decider.api_key or GEMINI_API_KEY")]
    MissingApiKey,
}
