//! Request and response bodies.

pub mod response;

pub use response::{HealthResponse, SessionInfoResponse, StatusResponse};
