//! Claims embedded in every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessionward_core::types::{Payload, Session, SessionHandle, UserId};

/// Access-token payload.
///
/// Timestamps are carried as epoch milliseconds. `parentRefreshTokenHash1`
/// is present only on the first access token minted by a refresh, until
/// the new refresh token is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    /// Session this token belongs to.
    pub session_handle: SessionHandle,
    /// Owner of the session.
    pub user_id: UserId,
    /// Application data readable by any token holder.
    #[serde(rename = "userData")]
    pub user_data_in_jwt: Payload,
    /// When this token stops verifying.
    #[serde(rename = "expiryTime", with = "chrono::serde::ts_milliseconds")]
    pub expiry_time: DateTime<Utc>,
    /// When this token was signed.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time_created: DateTime<Utc>,
    /// Hash of the refresh token consumed to mint this token, while unconfirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_refresh_token_hash1: Option<String>,
    /// Hash of the refresh token issued alongside this token.
    pub refresh_token_hash1: String,
    /// Anti-CSRF value bound to this session, when anti-CSRF uses tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_csrf_token: Option<String>,
}

impl AccessTokenClaims {
    /// Returns `true` once `now` reaches the expiry, allowing `leeway` of skew.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        self.expiry_time
            .checked_add_signed(leeway)
            .is_some_and(|limit| now >= limit)
    }

    /// Whether this token still waits for its refresh token to be confirmed.
    pub fn awaits_confirmation(&self) -> bool {
        self.parent_refresh_token_hash1.is_some()
    }

    /// Builds claims for `session`, with the access expiry capped by the session's.
    pub fn for_session(
        session: &Session,
        now: DateTime<Utc>,
        access_ttl: chrono::Duration,
        refresh_token_hash1: String,
        parent_refresh_token_hash1: Option<String>,
        anti_csrf_token: Option<String>,
    ) -> Self {
        Self {
            session_handle: session.handle.clone(),
            user_id: session.user_id.clone(),
            user_data_in_jwt: session.user_data_in_jwt.clone(),
            expiry_time: now
                .checked_add_signed(access_ttl)
                .map_or(session.expiry_time, |t| t.min(session.expiry_time)),
            time_created: now,
            parent_refresh_token_hash1,
            refresh_token_hash1,
            anti_csrf_token,
        }
    }
}
