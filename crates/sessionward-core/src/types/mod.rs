//! Core type definitions used across the Sessionward workspace.

pub mod id;
pub mod session;

pub use id::{SessionHandle, UserId};
pub use session::{Payload, Session};
