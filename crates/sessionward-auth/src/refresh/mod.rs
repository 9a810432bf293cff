//! Refresh-token format and rotation lineage.

pub mod handle;
pub mod rotation;

pub use handle::{RefreshTokenHandle, hash_refresh_token, mint_refresh_token};
pub use rotation::{RefreshLineage, RotationDecision};
