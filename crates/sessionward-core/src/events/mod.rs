//! Domain events emitted by session lifecycle operations.

pub mod session;

use async_trait::async_trait;
use tracing::{info, warn};

pub use session::SessionEvent;

use crate::traits::SessionEventSink;

/// Default sink that writes every event to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl SessionEventSink for TracingEventSink {
    async fn publish(&self, event: SessionEvent) {
        match &event {
            SessionEvent::TokenTheftDetected {
                session_handle,
                user_id,
            } => {
                warn!(
                    session_handle = %session_handle,
                    user_id = %user_id,
                    "Token theft detected, session lineage terminated"
                );
            }
            other => {
                info!(
                    event = other.name(),
                    session_handle = %other.session_handle(),
                    "Session event"
                );
            }
        }
    }
}
