//! Refresh-token wire format.
//!
//! A refresh token reads `v1.<session handle>.<secret>`. The handle is a
//! routing hint only: whether the token is still valid is decided by the
//! remote core, which matches the token's hash against the lineage.

use sha2::{Digest, Sha256};

use sessionward_core::error::AppError;
use sessionward_core::types::SessionHandle;

use crate::tokens::{RefreshToken, random_secret};

const VERSION: &str = "v1";
const SECRET_BYTES: usize = 32;

/// A refresh token split into its routing hint and the full token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenHandle {
    /// Session the token claims to belong to.
    pub session_handle: SessionHandle,
    /// The presented token.
    pub token: RefreshToken,
}

impl RefreshTokenHandle {
    /// Parses a presented refresh token.
    pub fn parse(token: &str) -> Result<Self, AppError> {
        let mut parts = token.splitn(3, '.');
        let (Some(version), Some(handle), Some(secret)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::malformed_token("Refresh token has too few segments"));
        };

        if version != VERSION {
            return Err(AppError::malformed_token(format!(
                "Unsupported refresh token version '{version}'"
            )));
        }
        if handle.is_empty() || secret.is_empty() || secret.contains('.') {
            return Err(AppError::malformed_token("Refresh token segments are invalid"));
        }

        Ok(Self {
            session_handle: SessionHandle::new(handle),
            token: RefreshToken::new(token),
        })
    }

    /// Lineage key of this token.
    pub fn hash(&self) -> String {
        hash_refresh_token(&self.token)
    }
}

/// Mints a fresh refresh token for `session_handle`.
pub fn mint_refresh_token(session_handle: &SessionHandle) -> RefreshToken {
    RefreshToken::new(format!(
        "{VERSION}.{session_handle}.{}",
        random_secret(SECRET_BYTES)
    ))
}

/// SHA-256 of the whole token, lowercase hex.
pub fn hash_refresh_token(token: &RefreshToken) -> String {
    format!("{:x}", Sha256::digest(token.as_str().as_bytes()))
}
