//! Shared fixtures for sessionward-auth integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sessionward_auth::{MemorySessionStore, SessionRecipe, SessionRecipeBuilder};
use sessionward_core::config::{SessionConfig, TokenConfig};
use sessionward_core::events::SessionEvent;
use sessionward_core::traits::{ManualClock, SessionEventSink};
use sessionward_core::types::Payload;

/// Event sink that remembers everything it was sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionEventSink for RecordingSink {
    async fn publish(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub recipe: SessionRecipe,
    pub store: MemorySessionStore,
    pub clock: Arc<ManualClock>,
    pub events: Arc<RecordingSink>,
}

pub fn harness(session_config: SessionConfig) -> Harness {
    harness_with(session_config, |b| b)
}

pub fn harness_with(
    session_config: SessionConfig,
    customise: impl FnOnce(SessionRecipeBuilder) -> SessionRecipeBuilder,
) -> Harness {
    let token_config = TokenConfig::default();
    let clock = Arc::new(ManualClock::starting_now());
    let events = Arc::new(RecordingSink::default());
    let store = MemorySessionStore::new(
        token_config.refresh_ttl().expect("Default refresh lifetime"),
        clock.clone(),
    );

    let builder = SessionRecipeBuilder::new(token_config, session_config, Arc::new(store.clone()))
        .clock(clock.clone())
        .event_sink(events.clone());
    let recipe = customise(builder).build().unwrap();

    Harness {
        recipe,
        store,
        clock,
        events,
    }
}

pub fn payload(pairs: &[(&str, &str)]) -> Payload {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect()
}
