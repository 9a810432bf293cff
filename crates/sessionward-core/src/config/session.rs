//! Session transport and protection configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How anti-CSRF protection is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiCsrfMode {
    /// No anti-CSRF protection.
    None,
    /// A session-bound random value must accompany state-changing requests.
    #[default]
    ViaToken,
    /// A custom request header (`rid`) must be present on refresh.
    ViaCustomHeader,
}

impl AntiCsrfMode {
    /// Whether a session-bound anti-CSRF token is minted.
    pub fn uses_token(&self) -> bool {
        matches!(self, Self::ViaToken)
    }
}

/// Where tokens travel between client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTransferMethod {
    /// `sAccessToken` / `sRefreshToken` cookies.
    Cookie,
    /// `Authorization` request header, `st-*` response headers.
    Header,
    /// Chosen per request by the `st-auth-mode` header, cookies by default.
    #[default]
    Any,
}

/// `SameSite` attribute for session cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSitePolicy {
    /// `SameSite=Strict`.
    Strict,
    /// `SameSite=Lax`.
    #[default]
    Lax,
    /// `SameSite=None`; requires `secure`.
    None,
}

/// Session cookie attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie `Domain` attribute.
    #[serde(default)]
    pub domain: Option<String>,
    /// Cookie `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure: bool,
    /// Cookie `SameSite` attribute.
    #[serde(default)]
    pub same_site: SameSitePolicy,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            domain: None,
            secure: true,
            same_site: SameSitePolicy::default(),
        }
    }
}

/// Session recipe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Anti-CSRF enforcement mode.
    #[serde(default)]
    pub anti_csrf: AntiCsrfMode,
    /// Confirm every access token with the remote core instead of trusting
    /// the signature alone. Closes the window between a remote revocation
    /// and access-token expiry at the cost of one round trip per request.
    #[serde(default)]
    pub check_database: bool,
    /// Token transport.
    #[serde(default)]
    pub token_transfer_method: TokenTransferMethod,
    /// Cookie attributes.
    #[serde(default)]
    pub cookie: CookieConfig,
    /// Path prefix all session endpoints are mounted under.
    #[serde(default = "default_api_base_path")]
    pub api_base_path: String,
    /// Refresh endpoint path below `api_base_path`.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Signout endpoint path below `api_base_path`.
    #[serde(default = "default_signout_path")]
    pub signout_path: String,
    /// Do not expose the refresh endpoint.
    #[serde(default)]
    pub disable_refresh_api: bool,
    /// Do not expose the signout endpoint.
    #[serde(default)]
    pub disable_signout_api: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            anti_csrf: AntiCsrfMode::default(),
            check_database: false,
            token_transfer_method: TokenTransferMethod::default(),
            cookie: CookieConfig::default(),
            api_base_path: default_api_base_path(),
            refresh_path: default_refresh_path(),
            signout_path: default_signout_path(),
            disable_refresh_api: false,
            disable_signout_api: false,
        }
    }
}

impl SessionConfig {
    /// Validates paths and cookie attributes.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, path) in [
            ("api_base_path", &self.api_base_path),
            ("refresh_path", &self.refresh_path),
            ("signout_path", &self.signout_path),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::configuration(format!(
                    "session.{name} must start with '/', got '{path}'"
                )));
            }
        }
        if self.refresh_path == self.signout_path {
            return Err(AppError::configuration(
                "session.refresh_path and session.signout_path must differ",
            ));
        }
        if self.cookie.same_site == SameSitePolicy::None && !self.cookie.secure {
            return Err(AppError::configuration(
                "session.cookie.same_site = \"none\" requires session.cookie.secure = true",
            ));
        }
        Ok(())
    }

    /// Full path of the refresh endpoint, used as the refresh cookie path.
    pub fn full_refresh_path(&self) -> String {
        join_paths(&self.api_base_path, &self.refresh_path)
    }

    /// Full path of the signout endpoint.
    pub fn full_signout_path(&self) -> String {
        join_paths(&self.api_base_path, &self.signout_path)
    }
}

fn join_paths(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn default_true() -> bool {
    true
}

fn default_api_base_path() -> String {
    "/auth".to_string()
}

fn default_refresh_path() -> String {
    "/session/refresh".to_string()
}

fn default_signout_path() -> String {
    "/signout".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_paths() {
        let config = SessionConfig::default();
        assert_eq!(config.full_refresh_path(), "/auth/session/refresh");
        assert_eq!(config.full_signout_path(), "/auth/signout");
    }

    #[test]
    fn test_same_site_none_needs_secure() {
        let config = SessionConfig {
            cookie: CookieConfig {
                domain: None,
                secure: false,
                same_site: SameSitePolicy::None,
            },
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_path_rejected() {
        let config = SessionConfig {
            refresh_path: "session/refresh".to_string(),
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_anti_csrf_mode_parses() {
        let mode: AntiCsrfMode = serde_json::from_str("\"via_custom_header\"").unwrap();
        assert_eq!(mode, AntiCsrfMode::ViaCustomHeader);
        assert!(!mode.uses_token());
    }
}
