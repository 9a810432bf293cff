//! Token codec: the single place access tokens are signed and verified
//! and refresh tokens are taken apart.

use std::sync::Arc;

use sessionward_core::config::TokenConfig;
use sessionward_core::error::AppError;
use sessionward_core::traits::Clock;

use crate::jwt::{AccessTokenClaims, JwtDecoder, JwtEncoder, SigningKeyRing};
use crate::refresh::RefreshTokenHandle;
use crate::tokens::AccessToken;

/// Signs and verifies access tokens, decodes refresh-token handles.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: Arc<SigningKeyRing>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
}

impl TokenCodec {
    /// Builds a codec over the configured signing keys.
    pub fn new(config: &TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let keys = Arc::new(SigningKeyRing::from_config(config, clock.clone())?);
        Ok(Self {
            encoder: JwtEncoder::new(keys.clone()),
            decoder: JwtDecoder::new(keys.clone(), config.leeway()?, clock),
            keys,
        })
    }

    /// Signs an access token.
    pub fn sign_access_token(&self, claims: &AccessTokenClaims) -> Result<AccessToken, AppError> {
        self.encoder.sign(claims)
    }

    /// Verifies an access token's structure, signature, and expiry.
    ///
    /// Fails with `MalformedToken`, `SignatureInvalid`, or `ExpiredToken`.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        self.decoder.verify(token)
    }

    /// Extracts the session routing hint from a refresh token without
    /// judging its validity.
    pub fn decode_refresh_token_handle(&self, token: &str) -> Result<RefreshTokenHandle, AppError> {
        RefreshTokenHandle::parse(token)
    }

    /// Makes a new key current; the previous one verifies for the
    /// configured overlap window.
    pub fn rotate_signing_key(&self, kid: &str, secret: &[u8]) -> Result<(), AppError> {
        self.keys.rotate(kid, secret)
    }

    /// Identifiers of every key that currently verifies.
    pub fn trusted_kids(&self) -> Vec<String> {
        self.keys.trusted_kids()
    }
}
