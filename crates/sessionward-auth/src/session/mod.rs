//! Session lifecycle: the operation set and its default implementation.

pub mod container;
pub mod manager;
pub mod operations;

pub use container::{IssuedSession, SessionContainer};
pub use manager::SessionManager;
pub use operations::SessionOperations;
