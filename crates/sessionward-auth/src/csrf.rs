//! Anti-CSRF protection.
//!
//! In token mode every session carries a random value the client must echo
//! in the `anti-csrf` header; it is bound into the access token and held by
//! the core for refreshes. In custom-header mode the client only has to
//! send a header a cross-site form cannot set.

use sessionward_core::config::AntiCsrfMode;
use sessionward_core::error::AppError;

use crate::tokens::random_secret;

const TOKEN_BYTES: usize = 32;

/// Mints and checks anti-CSRF values for one configured mode.
#[derive(Debug, Clone, Copy)]
pub struct AntiCsrfGuard {
    mode: AntiCsrfMode,
}

impl AntiCsrfGuard {
    /// Creates a guard for `mode`.
    pub fn new(mode: AntiCsrfMode) -> Self {
        Self { mode }
    }

    /// The configured mode.
    pub fn mode(&self) -> AntiCsrfMode {
        self.mode
    }

    /// Whether sessions carry an anti-CSRF token.
    pub fn uses_token(&self) -> bool {
        self.mode.uses_token()
    }

    /// A fresh token, or `None` when the mode does not use tokens.
    pub fn mint(&self) -> Option<String> {
        self.uses_token().then(|| random_secret(TOKEN_BYTES))
    }

    /// Checks a presented token against the session's bound value.
    ///
    /// A no-op unless the mode uses tokens. Both values must be present.
    pub fn verify_token(&self, expected: Option<&str>, presented: Option<&str>) -> Result<(), AppError> {
        if !self.uses_token() {
            return Ok(());
        }
        match (expected, presented) {
            (Some(expected), Some(presented))
                if constant_time_eq(expected.as_bytes(), presented.as_bytes()) =>
            {
                Ok(())
            }
            (_, None) => Err(AppError::anti_csrf_mismatch("Anti-CSRF token missing")),
            _ => Err(AppError::anti_csrf_mismatch("Anti-CSRF token mismatch")),
        }
    }

    /// Checks for the custom header when the mode requires one.
    pub fn verify_custom_header(&self, present: bool) -> Result<(), AppError> {
        if self.mode == AntiCsrfMode::ViaCustomHeader && !present {
            return Err(AppError::anti_csrf_mismatch(
                "Anti-CSRF custom header missing",
            ));
        }
        Ok(())
    }
}

/// Compares two byte strings in time independent of where they differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
