//! Remote core service configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which session store backs the recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreMode {
    /// Talk to a remote core over HTTP.
    Http,
    /// Keep sessions in process memory (single node, development, tests).
    #[default]
    Memory,
}

/// Connection settings for the session core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Store backend.
    #[serde(default)]
    pub mode: CoreMode,
    /// Base URI of the remote core.
    #[serde(default = "default_connection_uri")]
    pub connection_uri: String,
    /// API key sent in the `api-key` header.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// How often the in-memory store drops expired sessions.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            mode: CoreMode::default(),
            connection_uri: default_connection_uri(),
            api_key: None,
            timeout_ms: default_timeout(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

impl CoreConfig {
    /// Validates the connection settings.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_ms == 0 {
            return Err(AppError::configuration("core.timeout_ms must be positive"));
        }
        if self.mode == CoreMode::Http
            && !(self.connection_uri.starts_with("http://")
                || self.connection_uri.starts_with("https://"))
        {
            return Err(AppError::configuration(format!(
                "core.connection_uri must be an http(s) URI, got '{}'",
                self.connection_uri
            )));
        }
        Ok(())
    }
}

fn default_connection_uri() -> String {
    "http://localhost:3567".to_string()
}

fn default_timeout() -> u64 {
    5000
}

fn default_purge_interval() -> u64 {
    60
}
