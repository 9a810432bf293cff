//! The overridable HTTP-facing half of the session recipe.
//!
//! Handlers own the transport (reading tokens, writing cookies). What
//! happens in between is a [`SessionApis`] implementation, which an
//! application can wrap through [`ApiState::override_apis`](crate::state::ApiState::override_apis).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use sessionward_auth::{
    AccessToken, AntiCsrfGuard, IssuedSession, RefreshToken, SessionOperations, SessionRecipe,
};
use sessionward_core::error::{AppError, ErrorKind};
use sessionward_core::types::SessionHandle;

/// What the refresh endpoint read from the request.
#[derive(Debug, Clone, Default)]
pub struct RefreshRequest {
    /// The presented refresh token.
    pub refresh_token: Option<RefreshToken>,
    /// The `anti-csrf` header.
    pub anti_csrf_token: Option<String>,
    /// Whether the `rid` header was sent.
    pub has_rid: bool,
}

/// What the signout endpoint read from the request.
#[derive(Debug, Clone, Default)]
pub struct SignoutRequest {
    /// The presented access token.
    pub access_token: Option<AccessToken>,
    /// The `anti-csrf` header.
    pub anti_csrf_token: Option<String>,
    /// Whether the `rid` header was sent.
    pub has_rid: bool,
}

/// Result of a signout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignoutOutcome {
    /// The session was revoked.
    Revoked(SessionHandle),
    /// There was no live session to revoke.
    AlreadySignedOut,
}

/// Endpoint logic of the session recipe.
#[async_trait]
pub trait SessionApis: Send + Sync + 'static {
    /// `POST <refresh path>`.
    async fn refresh_post(&self, request: RefreshRequest) -> Result<IssuedSession, AppError>;

    /// `POST <signout path>`.
    async fn signout_post(&self, request: SignoutRequest) -> Result<SignoutOutcome, AppError>;
}

/// Endpoint logic over the recipe's operation set.
pub struct DefaultSessionApis {
    operations: Arc<dyn SessionOperations>,
    anti_csrf: AntiCsrfGuard,
}

impl DefaultSessionApis {
    /// Creates the default endpoints for `recipe`.
    pub fn new(recipe: &SessionRecipe) -> Self {
        Self {
            operations: recipe.operations(),
            anti_csrf: recipe.anti_csrf(),
        }
    }
}

#[async_trait]
impl SessionApis for DefaultSessionApis {
    async fn refresh_post(&self, request: RefreshRequest) -> Result<IssuedSession, AppError> {
        let Some(refresh_token) = request.refresh_token else {
            return Err(AppError::unauthorised("Refresh token not found"));
        };
        self.anti_csrf.verify_custom_header(request.has_rid)?;

        self.operations
            .refresh_session(refresh_token.as_str(), request.anti_csrf_token.as_deref())
            .await
    }

    async fn signout_post(&self, request: SignoutRequest) -> Result<SignoutOutcome, AppError> {
        let Some(access_token) = request.access_token else {
            return Ok(SignoutOutcome::AlreadySignedOut);
        };
        self.anti_csrf.verify_custom_header(request.has_rid)?;

        let session = match self
            .operations
            .get_session(access_token.as_str(), request.anti_csrf_token.as_deref(), true)
            .await
        {
            Ok(session) => session,
            Err(e) if e.is(ErrorKind::Unauthorised) => return Ok(SignoutOutcome::AlreadySignedOut),
            Err(e) => return Err(e),
        };

        if self.operations.revoke_session(&session.session_handle).await? {
            info!(session_handle = %session.session_handle, user_id = %session.user_id, "Signed out");
            Ok(SignoutOutcome::Revoked(session.session_handle))
        } else {
            Ok(SignoutOutcome::AlreadySignedOut)
        }
    }
}
