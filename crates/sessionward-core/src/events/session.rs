//! Session-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::{SessionHandle, UserId};

/// Events related to user sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session was created.
    Created {
        /// The session handle.
        session_handle: SessionHandle,
        /// The user ID.
        user_id: UserId,
    },
    /// A refresh token was rotated.
    Refreshed {
        /// The session handle.
        session_handle: SessionHandle,
        /// The user ID.
        user_id: UserId,
    },
    /// A session was revoked explicitly.
    Revoked {
        /// The session handle.
        session_handle: SessionHandle,
    },
    /// A stale refresh token was replayed and the lineage was killed.
    TokenTheftDetected {
        /// The terminated session handle.
        session_handle: SessionHandle,
        /// The owner who should be told.
        user_id: UserId,
    },
}

impl SessionEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Refreshed { .. } => "refreshed",
            Self::Revoked { .. } => "revoked",
            Self::TokenTheftDetected { .. } => "token_theft_detected",
        }
    }

    /// The session this event is about.
    pub fn session_handle(&self) -> &SessionHandle {
        match self {
            Self::Created { session_handle, .. }
            | Self::Refreshed { session_handle, .. }
            | Self::Revoked { session_handle }
            | Self::TokenTheftDetected { session_handle, .. } => session_handle,
        }
    }
}
