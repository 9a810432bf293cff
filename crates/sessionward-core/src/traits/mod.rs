//! Core traits defined in `sessionward-core` and implemented by other crates.

pub mod clock;
pub mod event_sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use event_sink::SessionEventSink;
