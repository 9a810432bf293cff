//! Access-token verification.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};

use sessionward_core::error::AppError;
use sessionward_core::traits::Clock;

use super::claims::AccessTokenClaims;
use super::keys::SigningKeyRing;

/// Verifies access tokens against the key ring and the injected clock.
///
/// Expiry is judged on the millisecond `expiryTime` claim rather than the
/// registered `exp` claim, so jsonwebtoken's own time checks are disabled.
#[derive(Clone)]
pub struct JwtDecoder {
    keys: Arc<SigningKeyRing>,
    validation: Validation,
    leeway: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("leeway", &self.leeway)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a decoder over a shared key ring.
    pub fn new(keys: Arc<SigningKeyRing>, leeway: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Self {
            keys,
            validation,
            leeway,
            clock,
        }
    }

    /// Decodes and validates an access token.
    ///
    /// Checks, in order:
    /// 1. Structure and `kid` header
    /// 2. Signature under a trusted key
    /// 3. Expiry against the clock
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::malformed_token(format!("Invalid token format: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| AppError::malformed_token("Token header has no key id"))?;
        let key = self
            .keys
            .verification_key(&kid)
            .ok_or_else(|| AppError::signature_invalid(format!("Unknown signing key '{kid}'")))?;

        let data = decode::<AccessTokenClaims>(token, &key, &self.validation).map_err(|e| {
            match e.kind() {
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                    AppError::signature_invalid("Invalid token signature")
                }
                _ => AppError::malformed_token(format!("Token validation failed: {e}")),
            }
        })?;

        let claims = data.claims;
        if claims.is_expired_at(self.clock.now(), self.leeway) {
            return Err(AppError::expired_token("Token has expired"));
        }
        Ok(claims)
    }
}
