//! Periodic purge of expired in-memory sessions.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

use super::memory::MemorySessionStore;

/// Spawns a task that purges `store` every `interval` until `cancel`
/// flips to `true`.
pub fn spawn_purge_task(
    store: MemorySessionStore,
    interval: Duration,
    mut cancel: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_seconds = interval.as_secs(), "Session purge task started");
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let purged = store.purge_expired().await;
                    debug!(purged, "Session purge cycle completed");
                }
            }
        }

        info!("Session purge task stopped");
    })
}
