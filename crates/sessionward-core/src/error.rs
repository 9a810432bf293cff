//! Unified application error types for Sessionward.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] decides how the
//! transport layer reacts (refresh, clear tokens, retry later).

use std::fmt;
use thiserror::Error;

use crate::types::{SessionHandle, UserId};

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The token could not be parsed at all.
    MalformedToken,
    /// The token signature verified but its expiry has passed.
    ExpiredToken,
    /// The token signature did not verify under any trusted key.
    SignatureInvalid,
    /// The access token is well-formed but stale; the client should refresh.
    TryRefreshToken,
    /// No valid session; the client must not retry.
    Unauthorised,
    /// The refresh token belongs to no live lineage.
    UnauthorisedTokenReuse,
    /// A stale refresh token resurfaced; the whole lineage was terminated.
    TokenTheftDetected,
    /// The anti-CSRF value was absent or did not match.
    AntiCsrfMismatch,
    /// The remote core service could not be reached or timed out.
    CoreUnavailable,
    /// The remote core does not know the session handle.
    SessionNotFound,
    /// The caller supplied invalid input.
    BadInput,
    /// The session recipe was initialised twice.
    AlreadyInitialised,
    /// The session recipe was used before initialisation.
    NotInitialised,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Returns the wire status string for this kind.
    pub fn as_status(&self) -> &'static str {
        match self {
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::TryRefreshToken => "TRY_REFRESH_TOKEN",
            Self::Unauthorised => "UNAUTHORISED",
            Self::UnauthorisedTokenReuse => "UNAUTHORISED_TOKEN_REUSE",
            Self::TokenTheftDetected => "TOKEN_THEFT_DETECTED",
            Self::AntiCsrfMismatch => "ANTI_CSRF_MISMATCH",
            Self::CoreUnavailable => "CORE_UNAVAILABLE",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::BadInput => "BAD_INPUT",
            Self::AlreadyInitialised => "ALREADY_INITIALISED",
            Self::NotInitialised => "NOT_INITIALISED",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether a refresh failing with this kind ends the client's session.
    ///
    /// Anti-CSRF failures and core outages leave the refresh token usable,
    /// so clearing the client's tokens would log out a legitimate user.
    pub fn is_terminal_for_refresh(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken
                | Self::ExpiredToken
                | Self::SignatureInvalid
                | Self::Unauthorised
                | Self::UnauthorisedTokenReuse
                | Self::TokenTheftDetected
                | Self::SessionNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_status())
    }
}

/// The session a theft report refers to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AffectedSession {
    /// Handle of the terminated lineage.
    pub session_handle: SessionHandle,
    /// Owner of the terminated lineage.
    pub user_id: UserId,
}

/// The unified application error used throughout Sessionward.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// The session involved, set for [`ErrorKind::TokenTheftDetected`].
    pub session: Option<AffectedSession>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            session: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            session: None,
        }
    }

    /// Create a malformed-token error.
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedToken, message)
    }

    /// Create an expired-token error.
    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpiredToken, message)
    }

    /// Create a signature-invalid error.
    pub fn signature_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureInvalid, message)
    }

    /// Create a try-refresh-token error.
    pub fn try_refresh_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TryRefreshToken, message)
    }

    /// Create an unauthorised error.
    pub fn unauthorised(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorised, message)
    }

    /// Create a token-reuse error.
    pub fn token_reuse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnauthorisedTokenReuse, message)
    }

    /// Create a token-theft error naming the terminated session.
    pub fn token_theft(session_handle: SessionHandle, user_id: UserId) -> Self {
        Self {
            kind: ErrorKind::TokenTheftDetected,
            message: format!("Refresh token replay detected for session {session_handle}"),
            source: None,
            session: Some(AffectedSession {
                session_handle,
                user_id,
            }),
        }
    }

    /// Create an anti-CSRF mismatch error.
    pub fn anti_csrf_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AntiCsrfMismatch, message)
    }

    /// Create a core-unavailable error.
    pub fn core_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CoreUnavailable, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionNotFound, message)
    }

    /// Create a bad-input error.
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadInput, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns `true` if this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            session: self.session.clone(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_wire_status() {
        let err = AppError::token_reuse("handle not current");
        assert_eq!(err.to_string(), "UNAUTHORISED_TOKEN_REUSE: handle not current");
    }

    #[test]
    fn test_theft_carries_session() {
        let handle = SessionHandle::new("h-1");
        let err = AppError::token_theft(handle.clone(), UserId::new("u1"));
        let affected = err.session.clone().unwrap();
        assert_eq!(affected.session_handle, handle);
        assert_eq!(affected.user_id.as_str(), "u1");
        assert!(err.is(ErrorKind::TokenTheftDetected));
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(ErrorKind::TokenTheftDetected.is_terminal_for_refresh());
        assert!(ErrorKind::UnauthorisedTokenReuse.is_terminal_for_refresh());
        assert!(!ErrorKind::AntiCsrfMismatch.is_terminal_for_refresh());
        assert!(!ErrorKind::CoreUnavailable.is_terminal_for_refresh());
        assert!(!ErrorKind::TryRefreshToken.is_terminal_for_refresh());
    }
}
