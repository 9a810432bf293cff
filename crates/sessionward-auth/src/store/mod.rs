//! The remote core contract.
//!
//! The core is the only durable owner of session records and refresh
//! lineages. [`CoreClient`] talks to a core over HTTP;
//! [`MemorySessionStore`] implements the same contract in-process.

pub mod cleanup;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use sessionward_core::error::AppError;
use sessionward_core::types::{Payload, Session, SessionHandle, UserId};

use crate::refresh::RefreshTokenHandle;
use crate::tokens::RefreshToken;

pub use cleanup::spawn_purge_task;
pub use http::CoreClient;
pub use memory::MemorySessionStore;

/// What the core hands back when a session is created or refreshed.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    /// The session as now stored.
    pub session: Session,
    /// The only refresh token that may be used next.
    pub refresh_token: RefreshToken,
    /// Anti-CSRF value bound to the session, when requested.
    pub anti_csrf_token: Option<String>,
}

/// Operations the session manager needs from the core.
///
/// Implementations must make `refresh_session` atomic per session: of any
/// number of concurrent calls presenting the same token, at most one may
/// rotate.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persists a new session and starts its refresh lineage.
    async fn create_session(
        &self,
        user_id: &UserId,
        user_data_in_jwt: Payload,
        user_data_in_database: Payload,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError>;

    /// Rotates the refresh token, or reports reuse or theft.
    async fn refresh_session(
        &self,
        refresh_token: &RefreshTokenHandle,
        anti_csrf_token: Option<&str>,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError>;

    /// Loads a live session. With `parent_refresh_token_hash1`, also
    /// confirms the lineage's current refresh token.
    async fn verify_session(
        &self,
        session_handle: &SessionHandle,
        parent_refresh_token_hash1: Option<&str>,
    ) -> Result<Session, AppError>;

    /// Removes one session. Returns `false` if it was already gone.
    async fn revoke_session(&self, session_handle: &SessionHandle) -> Result<bool, AppError>;

    /// Removes every session of `user_id`, returning the removed handles.
    async fn revoke_all_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError>;

    /// Lists the live sessions of `user_id`.
    async fn get_all_session_handles_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError>;

    /// Reads the server-side payload.
    async fn get_session_data(&self, session_handle: &SessionHandle) -> Result<Payload, AppError>;

    /// Replaces the server-side payload.
    async fn update_session_data(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError>;

    /// Reads the payload new access tokens will carry.
    async fn get_jwt_payload(&self, session_handle: &SessionHandle) -> Result<Payload, AppError>;

    /// Replaces the payload new access tokens will carry.
    async fn update_jwt_payload(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError>;
}
