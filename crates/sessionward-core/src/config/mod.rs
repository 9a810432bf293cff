//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod core_service;
pub mod logging;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::core_service::{CoreConfig, CoreMode};
pub use self::logging::LoggingConfig;
pub use self::session::{
    AntiCsrfMode, CookieConfig, SameSitePolicy, SessionConfig, TokenTransferMethod,
};
pub use self::token::{SigningKeyConfig, TokenConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote core service settings.
    #[serde(default)]
    pub core: CoreConfig,
    /// Token signing and lifetime settings.
    #[serde(default)]
    pub token: TokenConfig,
    /// Session transport and protection settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `SESSIONWARD__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SESSIONWARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), AppError> {
        self.token.validate()?;
        self.session.validate()?;
        self.core.validate()
    }
}
