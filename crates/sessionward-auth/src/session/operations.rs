//! The overridable session operation set.

use async_trait::async_trait;

use sessionward_core::error::AppError;
use sessionward_core::types::{Payload, SessionHandle, UserId};

use super::container::{IssuedSession, SessionContainer};

/// Every operation the session recipe exposes.
///
/// [`SessionManager`](super::SessionManager) is the default implementation.
/// Overrides implement this trait too and hold the implementation they
/// wrap, delegating whatever they do not change.
#[async_trait]
pub trait SessionOperations: Send + Sync + 'static {
    /// Starts a session for `user_id`.
    async fn create_new_session(
        &self,
        user_id: &UserId,
        user_data_in_jwt: Payload,
        user_data_in_database: Payload,
    ) -> Result<IssuedSession, AppError>;

    /// Verifies an access token and, when asked, its anti-CSRF value.
    ///
    /// An expired but well-signed token fails with `TryRefreshToken`;
    /// anything else invalid fails with `Unauthorised`.
    async fn get_session(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
    ) -> Result<SessionContainer, AppError>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh_session(
        &self,
        refresh_token: &str,
        anti_csrf_token: Option<&str>,
    ) -> Result<IssuedSession, AppError>;

    /// Ends a session. Returns `false` if it no longer existed.
    async fn revoke_session(&self, session_handle: &SessionHandle) -> Result<bool, AppError>;

    /// Ends every session of `user_id`.
    async fn revoke_all_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError>;

    /// Lists the live sessions of `user_id`.
    async fn get_all_session_handles_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError>;

    /// Reads the server-side session payload.
    async fn get_session_data(&self, session_handle: &SessionHandle) -> Result<Payload, AppError>;

    /// Replaces the server-side session payload.
    async fn update_session_data(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError>;

    /// Reads the payload new access tokens will carry.
    async fn get_jwt_payload(&self, session_handle: &SessionHandle) -> Result<Payload, AppError>;

    /// Replaces the payload new access tokens will carry. Tokens already
    /// issued keep their copy until they are refreshed.
    async fn update_jwt_payload(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError>;
}
