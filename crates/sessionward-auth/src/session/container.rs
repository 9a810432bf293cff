//! Values handed from the session manager to the transport layer.

use chrono::{DateTime, Utc};

use sessionward_core::types::{Payload, SessionHandle, UserId};

use crate::tokens::{AccessToken, RefreshToken};

/// A freshly issued token pair, as returned by create and refresh.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The session's handle.
    pub session_handle: SessionHandle,
    /// The session's owner.
    pub user_id: UserId,
    /// Payload carried by the new access token.
    pub user_data_in_jwt: Payload,
    /// New access token.
    pub access_token: AccessToken,
    /// When the access token expires.
    pub access_token_expiry: DateTime<Utc>,
    /// New refresh token. The previous one is no longer current.
    pub refresh_token: RefreshToken,
    /// When the session (and refresh token) expires.
    pub refresh_token_expiry: DateTime<Utc>,
    /// Anti-CSRF value for the client to echo, in token mode.
    pub anti_csrf_token: Option<String>,
}

/// A verified session, as returned by `get_session`.
#[derive(Debug, Clone)]
pub struct SessionContainer {
    /// The session's handle.
    pub session_handle: SessionHandle,
    /// The session's owner.
    pub user_id: UserId,
    /// Payload carried by the access token.
    pub user_data_in_jwt: Payload,
    /// When the access token in use expires.
    pub access_token_expiry: DateTime<Utc>,
    /// Replacement access token the client should switch to, if one was
    /// issued while verifying.
    pub new_access_token: Option<AccessToken>,
}
