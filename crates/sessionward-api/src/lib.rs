//! # sessionward-api
//!
//! HTTP layer for Sessionward built on Axum.
//!
//! Provides the refresh and signout endpoints, token transport over
//! cookies or headers, the `VerifiedSession` extractor for application
//! routes, CORS metadata, and error mapping.

pub mod apis;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod transport;

pub use apis::{DefaultSessionApis, SessionApis};
pub use error::ApiError;
pub use extractors::VerifiedSession;
pub use router::build_router;
pub use state::ApiState;
