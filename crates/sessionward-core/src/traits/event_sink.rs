//! Receiver for session lifecycle events.

use async_trait::async_trait;

use crate::events::SessionEvent;

/// Consumes session events (audit logging, user notification, metrics).
///
/// Sinks are invoked after the state change has been committed by the
/// remote core. They must not fail the operation that produced the event.
#[async_trait]
pub trait SessionEventSink: Send + Sync + std::fmt::Debug + 'static {
    /// Handle one event.
    async fn publish(&self, event: SessionEvent);
}
