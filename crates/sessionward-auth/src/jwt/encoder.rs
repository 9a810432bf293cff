//! Access-token signing.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, Header, encode};

use sessionward_core::error::AppError;

use super::claims::AccessTokenClaims;
use super::keys::SigningKeyRing;
use crate::tokens::AccessToken;

/// Signs access tokens with the ring's current key.
#[derive(Debug, Clone)]
pub struct JwtEncoder {
    keys: Arc<SigningKeyRing>,
}

impl JwtEncoder {
    /// Creates an encoder over a shared key ring.
    pub fn new(keys: Arc<SigningKeyRing>) -> Self {
        Self { keys }
    }

    /// Signs `claims` with HS256, naming the key in the `kid` header.
    pub fn sign(&self, claims: &AccessTokenClaims) -> Result<AccessToken, AppError> {
        let key = self.keys.signing_key();
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(key.kid().to_string());

        let token = encode(&header, claims, key.encoding_key())
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;
        Ok(AccessToken::new(token))
    }
}
