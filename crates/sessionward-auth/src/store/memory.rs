//! In-process core for tests and single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sessionward_core::error::AppError;
use sessionward_core::traits::Clock;
use sessionward_core::types::{Payload, Session, SessionHandle, UserId};

use super::{SessionGrant, SessionStore};
use crate::csrf::AntiCsrfGuard;
use crate::refresh::{
    RefreshLineage, RefreshTokenHandle, RotationDecision, hash_refresh_token, mint_refresh_token,
};
use sessionward_core::config::AntiCsrfMode;

/// One stored session and its refresh lineage.
#[derive(Debug)]
struct StoredSession {
    session: Session,
    user_data_in_database: Payload,
    lineage: RefreshLineage,
    anti_csrf_token: Option<String>,
}

/// In-memory session core guarded by a single Tokio mutex.
///
/// Suitable for single-node deployments only. Every operation holds the
/// lock for its whole read-check-mutate sequence.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionHandle, StoredSession>>>,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    /// Creates an empty store whose sessions live `refresh_ttl` past their
    /// last refresh.
    pub fn new(refresh_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            refresh_ttl,
            clock,
        }
    }

    /// Drops every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !stored.session.is_expired_at(now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Expiry of a session created or refreshed now.
    fn next_expiry(&self) -> Result<DateTime<Utc>, AppError> {
        self.clock
            .now()
            .checked_add_signed(self.refresh_ttl)
            .ok_or_else(|| AppError::internal("Session expiry is out of range"))
    }

    fn not_found(handle: &SessionHandle) -> AppError {
        AppError::session_not_found(format!("Session {handle} does not exist"))
    }
}

/// Looks up a live session, dropping it if it has expired.
fn live<'a>(
    sessions: &'a mut HashMap<SessionHandle, StoredSession>,
    handle: &SessionHandle,
    clock: &dyn Clock,
) -> Option<&'a mut StoredSession> {
    let expired = sessions
        .get(handle)
        .is_some_and(|s| s.session.is_expired_at(clock.now()));
    if expired {
        sessions.remove(handle);
        debug!(session_handle = %handle, "Dropped expired session on access");
        return None;
    }
    sessions.get_mut(handle)
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        user_id: &UserId,
        user_data_in_jwt: Payload,
        user_data_in_database: Payload,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError> {
        let handle = SessionHandle::generate();
        let refresh_token = mint_refresh_token(&handle);
        let anti_csrf_token = enable_anti_csrf
            .then(|| AntiCsrfGuard::new(AntiCsrfMode::ViaToken).mint())
            .flatten();
        let session = Session {
            handle: handle.clone(),
            user_id: user_id.clone(),
            user_data_in_jwt,
            expiry_time: self.next_expiry()?,
        };

        let stored = StoredSession {
            session: session.clone(),
            user_data_in_database,
            lineage: RefreshLineage::new(hash_refresh_token(&refresh_token)),
            anti_csrf_token: anti_csrf_token.clone(),
        };
        self.sessions.lock().await.insert(handle, stored);

        Ok(SessionGrant {
            session,
            refresh_token,
            anti_csrf_token,
        })
    }

    async fn refresh_session(
        &self,
        refresh_token: &RefreshTokenHandle,
        anti_csrf_token: Option<&str>,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError> {
        let handle = &refresh_token.session_handle;
        let presented = refresh_token.hash();
        let mut sessions = self.sessions.lock().await;

        let Some(stored) = live(&mut sessions, handle, self.clock.as_ref()) else {
            return Err(AppError::token_reuse(
                "Refresh token does not belong to a live session",
            ));
        };

        match stored.lineage.classify(&presented) {
            RotationDecision::Reuse => {
                warn!(session_handle = %handle, "Refresh token is not current");
                return Err(AppError::token_reuse("Refresh token is not current"));
            }
            RotationDecision::Theft => {
                stored.lineage.terminate();
                let user_id = stored.session.user_id.clone();
                sessions.remove(handle);
                warn!(
                    session_handle = %handle,
                    user_id = %user_id,
                    "Superseded refresh token replayed, session terminated"
                );
                return Err(AppError::token_theft(handle.clone(), user_id));
            }
            RotationDecision::Rotate => {}
        }

        let guard = if enable_anti_csrf {
            AntiCsrfGuard::new(AntiCsrfMode::ViaToken)
        } else {
            AntiCsrfGuard::new(AntiCsrfMode::None)
        };
        guard.verify_token(stored.anti_csrf_token.as_deref(), anti_csrf_token)?;

        let expiry_time = self.next_expiry()?;
        let next = mint_refresh_token(handle);
        stored.lineage.advance(hash_refresh_token(&next));
        stored.session.expiry_time = expiry_time;
        if enable_anti_csrf {
            stored.anti_csrf_token = guard.mint();
        }

        debug!(session_handle = %handle, "Refresh token rotated");

        Ok(SessionGrant {
            session: stored.session.clone(),
            refresh_token: next,
            anti_csrf_token: stored.anti_csrf_token.clone(),
        })
    }

    async fn verify_session(
        &self,
        session_handle: &SessionHandle,
        parent_refresh_token_hash1: Option<&str>,
    ) -> Result<Session, AppError> {
        let mut sessions = self.sessions.lock().await;
        let stored = live(&mut sessions, session_handle, self.clock.as_ref())
            .ok_or_else(|| Self::not_found(session_handle))?;

        if let Some(parent) = parent_refresh_token_hash1 {
            if stored.lineage.confirm(parent) {
                debug!(session_handle = %session_handle, "Refresh token confirmed");
            }
        }
        Ok(stored.session.clone())
    }

    async fn revoke_session(&self, session_handle: &SessionHandle) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().await;
        let existed = live(&mut sessions, session_handle, self.clock.as_ref()).is_some();
        sessions.remove(session_handle);
        Ok(existed)
    }

    async fn revoke_all_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let owned: Vec<SessionHandle> = sessions
            .iter()
            .filter(|(_, s)| &s.session.user_id == user_id)
            .map(|(h, _)| h.clone())
            .collect();

        let mut revoked = Vec::with_capacity(owned.len());
        for handle in owned {
            if let Some(stored) = sessions.remove(&handle) {
                if !stored.session.is_expired_at(now) {
                    revoked.push(handle);
                }
            }
        }
        Ok(revoked)
    }

    async fn get_all_session_handles_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        let now = self.clock.now();
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .iter()
            .filter(|(_, s)| &s.session.user_id == user_id && !s.session.is_expired_at(now))
            .map(|(h, _)| h.clone())
            .collect())
    }

    async fn get_session_data(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        let mut sessions = self.sessions.lock().await;
        live(&mut sessions, session_handle, self.clock.as_ref())
            .map(|s| s.user_data_in_database.clone())
            .ok_or_else(|| Self::not_found(session_handle))
    }

    async fn update_session_data(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        let stored = live(&mut sessions, session_handle, self.clock.as_ref())
            .ok_or_else(|| Self::not_found(session_handle))?;
        stored.user_data_in_database = data;
        Ok(())
    }

    async fn get_jwt_payload(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        let mut sessions = self.sessions.lock().await;
        live(&mut sessions, session_handle, self.clock.as_ref())
            .map(|s| s.session.user_data_in_jwt.clone())
            .ok_or_else(|| Self::not_found(session_handle))
    }

    async fn update_jwt_payload(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        let stored = live(&mut sessions, session_handle, self.clock.as_ref())
            .ok_or_else(|| Self::not_found(session_handle))?;
        stored.session.user_data_in_jwt = data;
        Ok(())
    }
}
