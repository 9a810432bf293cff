//! HMAC signing keys with identifier-based lookup and rotation.
//!
//! The ring holds exactly one signing key plus any number of
//! verification-only keys. A key replaced by [`SigningKeyRing::rotate`]
//! keeps verifying until its overlap window closes; keys configured as
//! verification-only never lapse on their own.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::info;

use sessionward_core::config::TokenConfig;
use sessionward_core::error::AppError;
use sessionward_core::traits::Clock;

/// One HMAC-SHA256 key.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    verify_until: Option<DateTime<Utc>>,
}

impl SigningKey {
    /// Builds a key from a raw shared secret.
    pub fn from_secret(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            kid: kid.into(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            verify_until: None,
        }
    }

    /// Key identifier carried in the JWT header.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Key used to sign.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    fn verifies_at(&self, now: DateTime<Utc>) -> bool {
        self.verify_until.is_none_or(|until| now < until)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("verify_until", &self.verify_until)
            .finish()
    }
}

#[derive(Debug)]
struct KeySet {
    current: SigningKey,
    previous: Vec<SigningKey>,
}

/// Trusted signing keys, swapped atomically on rotation.
#[derive(Debug)]
pub struct SigningKeyRing {
    keys: RwLock<Arc<KeySet>>,
    overlap: Duration,
    clock: Arc<dyn Clock>,
}

impl SigningKeyRing {
    /// Builds the ring from configuration. The first key signs.
    pub fn from_config(config: &TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let mut keys = config
            .signing_keys
            .iter()
            .map(|k| SigningKey::from_secret(k.kid.clone(), k.secret.as_bytes()));
        let current = keys
            .next()
            .ok_or_else(|| AppError::configuration("At least one signing key is required"))?;
        let previous: Vec<SigningKey> = keys.collect();

        Ok(Self {
            keys: RwLock::new(Arc::new(KeySet { current, previous })),
            overlap: config.key_overlap()?,
            clock,
        })
    }

    fn snapshot(&self) -> Arc<KeySet> {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the key new tokens are signed with.
    pub fn signing_key(&self) -> SigningKey {
        self.snapshot().current.clone()
    }

    /// Looks up a key that may verify a token carrying `kid` right now.
    pub fn verification_key(&self, kid: &str) -> Option<DecodingKey> {
        let keys = self.snapshot();
        if keys.current.kid == kid {
            return Some(keys.current.decoding.clone());
        }
        let now = self.clock.now();
        keys.previous
            .iter()
            .find(|k| k.kid == kid && k.verifies_at(now))
            .map(|k| k.decoding.clone())
    }

    /// Installs a new signing key. The replaced key verifies for the
    /// configured overlap window; lapsed keys are dropped.
    pub fn rotate(&self, kid: impl Into<String>, secret: &[u8]) -> Result<(), AppError> {
        let kid = kid.into();
        let now = self.clock.now();
        let mut guard = self.keys.write().unwrap_or_else(|e| e.into_inner());

        if guard.current.kid == kid || guard.previous.iter().any(|k| k.kid == kid) {
            return Err(AppError::bad_input(format!(
                "Signing key '{kid}' is already in the ring"
            )));
        }

        let mut retired = guard.current.clone();
        retired.verify_until = Some(
            now.checked_add_signed(self.overlap)
                .ok_or_else(|| AppError::internal("Key overlap window is out of range"))?,
        );

        let mut previous: Vec<SigningKey> = guard
            .previous
            .iter()
            .filter(|k| k.verifies_at(now))
            .cloned()
            .collect();
        previous.push(retired);

        info!(
            new_kid = %kid,
            retired_kid = %guard.current.kid,
            overlap_seconds = self.overlap.num_seconds(),
            "Signing key rotated"
        );

        *guard = Arc::new(KeySet {
            current: SigningKey::from_secret(kid, secret),
            previous,
        });
        Ok(())
    }

    /// Identifiers of every key that currently verifies.
    pub fn trusted_kids(&self) -> Vec<String> {
        let keys = self.snapshot();
        let now = self.clock.now();
        std::iter::once(keys.current.kid.clone())
            .chain(
                keys.previous
                    .iter()
                    .filter(|k| k.verifies_at(now))
                    .map(|k| k.kid.clone()),
            )
            .collect()
    }
}
