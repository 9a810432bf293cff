//! # sessionward-core
//!
//! Core crate for Sessionward. Contains the unified error system,
//! configuration schemas, session identifiers and records, the clock
//! abstraction, and session domain events.
//!
//! This crate has **no** internal dependencies on other Sessionward crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
