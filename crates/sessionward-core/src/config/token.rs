//! Token signing and lifetime configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest lifetime or window any token setting may express: ten years.
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// One HMAC signing key.
#[derive(Clone, Serialize, Deserialize)]
pub struct SigningKeyConfig {
    /// Key identifier placed in the JWT header.
    pub kid: String,
    /// Shared secret for HMAC-SHA256.
    pub secret: String,
}

impl std::fmt::Debug for SigningKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyConfig")
            .field("kid", &self.kid)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Access- and refresh-token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    /// Refresh token (and session) lifetime in minutes, measured from the
    /// last successful refresh.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_minutes: u64,
    /// Signing keys. The first entry signs, the rest only verify.
    #[serde(default = "default_signing_keys")]
    pub signing_keys: Vec<SigningKeyConfig>,
    /// How long a replaced key keeps verifying after rotation.
    #[serde(default = "default_key_overlap")]
    pub key_overlap_seconds: u64,
    /// Accepted clock skew when checking access-token expiry.
    #[serde(default)]
    pub leeway_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_seconds: default_access_ttl(),
            refresh_token_ttl_minutes: default_refresh_ttl(),
            signing_keys: default_signing_keys(),
            key_overlap_seconds: default_key_overlap(),
            leeway_seconds: 0,
        }
    }
}

impl TokenConfig {
    /// Validates lifetimes and keys.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_token_ttl_seconds == 0 {
            return Err(AppError::configuration(
                "token.access_token_ttl_seconds must be positive",
            ));
        }
        if self.refresh_token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "token.refresh_token_ttl_minutes must be positive",
            ));
        }
        let refresh_seconds = self.refresh_token_seconds()?;
        bounded("token.access_token_ttl_seconds", self.access_token_ttl_seconds)?;
        bounded("token.key_overlap_seconds", self.key_overlap_seconds)?;
        bounded("token.leeway_seconds", self.leeway_seconds)?;
        if refresh_seconds < self.access_token_ttl_seconds {
            return Err(AppError::configuration(
                "token.refresh_token_ttl_minutes must cover at least one access token lifetime",
            ));
        }
        if self.signing_keys.is_empty() {
            return Err(AppError::configuration(
                "token.signing_keys must contain at least one key",
            ));
        }
        for key in &self.signing_keys {
            if key.kid.is_empty() || key.secret.is_empty() {
                return Err(AppError::configuration(
                    "token.signing_keys entries need a kid and a secret",
                ));
            }
        }
        Ok(())
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Result<Duration, AppError> {
        lifetime("token.access_token_ttl_seconds", self.access_token_ttl_seconds)
    }

    /// Session lifetime past its last refresh.
    pub fn refresh_ttl(&self) -> Result<Duration, AppError> {
        lifetime(
            "token.refresh_token_ttl_minutes",
            self.refresh_token_seconds()?,
        )
    }

    /// Verification window of a replaced signing key.
    pub fn key_overlap(&self) -> Result<Duration, AppError> {
        lifetime("token.key_overlap_seconds", self.key_overlap_seconds)
    }

    /// Accepted clock skew.
    pub fn leeway(&self) -> Result<Duration, AppError> {
        lifetime("token.leeway_seconds", self.leeway_seconds)
    }

    fn refresh_token_seconds(&self) -> Result<u64, AppError> {
        let seconds = self
            .refresh_token_ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| too_long("token.refresh_token_ttl_minutes"))?;
        bounded("token.refresh_token_ttl_minutes", seconds)
    }
}

fn bounded(field: &str, seconds: u64) -> Result<u64, AppError> {
    if seconds > MAX_LIFETIME_SECONDS {
        return Err(too_long(field));
    }
    Ok(seconds)
}

fn lifetime(field: &str, seconds: u64) -> Result<Duration, AppError> {
    let seconds = bounded(field, seconds)?;
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| too_long(field))
}

fn too_long(field: &str) -> AppError {
    AppError::configuration(format!(
        "{field} exceeds the maximum of {MAX_LIFETIME_SECONDS} seconds"
    ))
}

fn default_access_ttl() -> u64 {
    3600
}

fn default_refresh_ttl() -> u64 {
    144_000
}

fn default_signing_keys() -> Vec<SigningKeyConfig> {
    vec![SigningKeyConfig {
        kid: "default".to_string(),
        secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
    }]
}

fn default_key_overlap() -> u64 {
    300
}
