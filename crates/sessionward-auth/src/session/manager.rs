//! Session lifecycle manager: create, verify, refresh, revoke.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use sessionward_core::config::{SessionConfig, TokenConfig};
use sessionward_core::error::{AppError, ErrorKind};
use sessionward_core::events::SessionEvent;
use sessionward_core::traits::{Clock, SessionEventSink};
use sessionward_core::types::{Payload, SessionHandle, UserId};

use super::container::{IssuedSession, SessionContainer};
use super::operations::SessionOperations;
use crate::codec::TokenCodec;
use crate::csrf::AntiCsrfGuard;
use crate::jwt::AccessTokenClaims;
use crate::refresh::hash_refresh_token;
use crate::store::{SessionGrant, SessionStore};
use crate::tokens::AccessToken;

/// Default [`SessionOperations`] implementation.
///
/// Owns no session state: every durable decision is delegated to the
/// [`SessionStore`], and access tokens are signed locally.
#[derive(Clone)]
pub struct SessionManager {
    /// Remote core.
    store: Arc<dyn SessionStore>,
    /// Access-token signing and verification.
    codec: Arc<TokenCodec>,
    /// Anti-CSRF policy.
    anti_csrf: AntiCsrfGuard,
    /// Time source for token lifetimes.
    clock: Arc<dyn Clock>,
    /// Lifecycle event receiver.
    events: Arc<dyn SessionEventSink>,
    /// Access token lifetime.
    access_ttl: Duration,
    /// Confirm every access token with the core.
    check_database: bool,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("anti_csrf", &self.anti_csrf.mode())
            .field("access_ttl", &self.access_ttl)
            .field("check_database", &self.check_database)
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager over a store and codec.
    ///
    /// Fails if the configured access token lifetime is out of range.
    pub fn new(
        store: Arc<dyn SessionStore>,
        codec: Arc<TokenCodec>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn SessionEventSink>,
        token_config: &TokenConfig,
        session_config: &SessionConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            store,
            codec,
            anti_csrf: AntiCsrfGuard::new(session_config.anti_csrf),
            clock,
            events,
            access_ttl: token_config.access_ttl()?,
            check_database: session_config.check_database,
        })
    }

    /// Signs the access token that accompanies a grant.
    fn issue(
        &self,
        grant: SessionGrant,
        parent_refresh_token_hash1: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let claims = AccessTokenClaims::for_session(
            &grant.session,
            self.clock.now(),
            self.access_ttl,
            hash_refresh_token(&grant.refresh_token),
            parent_refresh_token_hash1,
            grant.anti_csrf_token.clone(),
        );
        let access_token = self.codec.sign_access_token(&claims)?;

        Ok(IssuedSession {
            session_handle: grant.session.handle,
            user_id: grant.session.user_id,
            user_data_in_jwt: claims.user_data_in_jwt,
            access_token,
            access_token_expiry: claims.expiry_time,
            refresh_token: grant.refresh_token,
            refresh_token_expiry: grant.session.expiry_time,
            anti_csrf_token: grant.anti_csrf_token,
        })
    }

    /// Re-signs `claims` without the parent hash, carrying `payload`.
    fn reissue_confirmed(
        &self,
        claims: &AccessTokenClaims,
        payload: Payload,
    ) -> Result<(AccessToken, AccessTokenClaims), AppError> {
        let confirmed = AccessTokenClaims {
            user_data_in_jwt: payload,
            time_created: self.clock.now(),
            parent_refresh_token_hash1: None,
            ..claims.clone()
        };
        let token = self.codec.sign_access_token(&confirmed)?;
        Ok((token, confirmed))
    }

    fn container(
        claims: AccessTokenClaims,
        new_access_token: Option<AccessToken>,
    ) -> SessionContainer {
        SessionContainer {
            session_handle: claims.session_handle,
            user_id: claims.user_id,
            user_data_in_jwt: claims.user_data_in_jwt,
            access_token_expiry: claims.expiry_time,
            new_access_token,
        }
    }
}

/// Handle-based operations report a missing session as `Unauthorised`.
fn session_gone(err: AppError) -> AppError {
    if err.is(ErrorKind::SessionNotFound) {
        AppError::unauthorised(err.message)
    } else {
        err
    }
}

#[async_trait]
impl SessionOperations for SessionManager {
    async fn create_new_session(
        &self,
        user_id: &UserId,
        user_data_in_jwt: Payload,
        user_data_in_database: Payload,
    ) -> Result<IssuedSession, AppError> {
        let grant = self
            .store
            .create_session(
                user_id,
                user_data_in_jwt,
                user_data_in_database,
                self.anti_csrf.uses_token(),
            )
            .await?;
        let issued = self.issue(grant, None)?;

        info!(
            session_handle = %issued.session_handle,
            user_id = %issued.user_id,
            "Session created"
        );
        self.events
            .publish(SessionEvent::Created {
                session_handle: issued.session_handle.clone(),
                user_id: issued.user_id.clone(),
            })
            .await;

        Ok(issued)
    }

    async fn get_session(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
    ) -> Result<SessionContainer, AppError> {
        let claims = self
            .codec
            .verify_access_token(access_token)
            .map_err(|e| match e.kind {
                ErrorKind::ExpiredToken => AppError::try_refresh_token("Access token has expired"),
                _ => {
                    debug!(reason = %e, "Access token rejected");
                    AppError::unauthorised(format!("Access token rejected: {}", e.message))
                }
            })?;

        if do_anti_csrf_check {
            self.anti_csrf
                .verify_token(claims.anti_csrf_token.as_deref(), anti_csrf_token)
                .inspect_err(|e| {
                    warn!(
                        session_handle = %claims.session_handle,
                        reason = %e.message,
                        "Anti-CSRF check failed"
                    );
                })?;
        }

        let Some(parent) = claims.parent_refresh_token_hash1.clone() else {
            if !self.check_database {
                return Ok(Self::container(claims, None));
            }
            let session = self
                .store
                .verify_session(&claims.session_handle, None)
                .await
                .map_err(session_gone)?;
            if session.user_id != claims.user_id {
                return Err(AppError::unauthorised("Session belongs to another user"));
            }
            return Ok(Self::container(claims, None));
        };

        // First use of a token minted by a refresh confirms the new lineage
        let session = self
            .store
            .verify_session(&claims.session_handle, Some(&parent))
            .await
            .map_err(session_gone)?;
        if session.user_id != claims.user_id {
            return Err(AppError::unauthorised("Session belongs to another user"));
        }

        let (token, confirmed) = self.reissue_confirmed(&claims, session.user_data_in_jwt)?;
        debug!(session_handle = %confirmed.session_handle, "Refresh token confirmed");
        Ok(Self::container(confirmed, Some(token)))
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
        anti_csrf_token: Option<&str>,
    ) -> Result<IssuedSession, AppError> {
        let handle = self.codec.decode_refresh_token_handle(refresh_token)?;
        let consumed = handle.hash();

        let grant = match self
            .store
            .refresh_session(&handle, anti_csrf_token, self.anti_csrf.uses_token())
            .await
        {
            Ok(grant) => grant,
            Err(e) => {
                let theft = e
                    .session
                    .clone()
                    .filter(|_| e.is(ErrorKind::TokenTheftDetected));
                if let Some(affected) = theft {
                    warn!(
                        session_handle = %affected.session_handle,
                        user_id = %affected.user_id,
                        "Token theft detected"
                    );
                    self.events
                        .publish(SessionEvent::TokenTheftDetected {
                            session_handle: affected.session_handle,
                            user_id: affected.user_id,
                        })
                        .await;
                } else {
                    debug!(
                        session_handle = %handle.session_handle,
                        kind = %e.kind,
                        "Refresh rejected"
                    );
                }
                return Err(e);
            }
        };

        let issued = self.issue(grant, Some(consumed))?;
        self.events
            .publish(SessionEvent::Refreshed {
                session_handle: issued.session_handle.clone(),
                user_id: issued.user_id.clone(),
            })
            .await;

        Ok(issued)
    }

    async fn revoke_session(&self, session_handle: &SessionHandle) -> Result<bool, AppError> {
        let revoked = self.store.revoke_session(session_handle).await?;
        if revoked {
            info!(session_handle = %session_handle, "Session revoked");
            self.events
                .publish(SessionEvent::Revoked {
                    session_handle: session_handle.clone(),
                })
                .await;
        }
        Ok(revoked)
    }

    async fn revoke_all_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        let revoked = self.store.revoke_all_sessions_for_user(user_id).await?;
        info!(user_id = %user_id, count = revoked.len(), "Sessions revoked for user");
        for handle in &revoked {
            self.events
                .publish(SessionEvent::Revoked {
                    session_handle: handle.clone(),
                })
                .await;
        }
        Ok(revoked)
    }

    async fn get_all_session_handles_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        self.store.get_all_session_handles_for_user(user_id).await
    }

    async fn get_session_data(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        self.store
            .get_session_data(session_handle)
            .await
            .map_err(session_gone)
    }

    async fn update_session_data(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        self.store
            .update_session_data(session_handle, data)
            .await
            .map_err(session_gone)
    }

    async fn get_jwt_payload(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        self.store
            .get_jwt_payload(session_handle)
            .await
            .map_err(session_gone)
    }

    async fn update_jwt_payload(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        self.store
            .update_jwt_payload(session_handle, data)
            .await
            .map_err(session_gone)
    }
}
