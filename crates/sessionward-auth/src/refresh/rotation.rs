//! Rotation lineage of one session's refresh tokens.
//!
//! Every refresh consumes the current token and installs a new one. The
//! consumed token stays recognisable as the *parent* until the new token
//! is confirmed, either by being used for the next refresh or by the
//! first request carrying an access token minted from it. Until then a
//! second presentation of the parent is an ordinary race (two tabs
//! refreshing at once) and is rejected without side effects. Once the
//! new token is confirmed, any older token resurfacing means two parties
//! hold the same lineage, and the session is terminated.

use std::collections::HashSet;

/// Outcome of presenting a refresh token to a lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDecision {
    /// The presented token is current; the caller should rotate.
    Rotate,
    /// The token is not usable, but its reuse proves nothing.
    Reuse,
    /// A superseded token resurfaced; the lineage must be terminated.
    Theft,
}

/// Lifecycle state of a lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageState {
    /// Tokens in the lineage may still be refreshed.
    Active,
    /// Revoked, expired, or killed by theft detection.
    Terminated,
}

/// Hash history of one session's refresh tokens.
#[derive(Debug, Clone)]
pub struct RefreshLineage {
    current: String,
    current_confirmed: bool,
    parent: Option<String>,
    retired: HashSet<String>,
    state: LineageState,
}

impl RefreshLineage {
    /// Starts a lineage whose first token needs no confirmation.
    pub fn new(initial_hash: String) -> Self {
        Self {
            current: initial_hash,
            current_confirmed: true,
            parent: None,
            retired: HashSet::new(),
            state: LineageState::Active,
        }
    }

    /// Judges a presented token hash without changing the lineage.
    pub fn classify(&self, presented: &str) -> RotationDecision {
        if self.state == LineageState::Terminated {
            return RotationDecision::Reuse;
        }
        if presented == self.current {
            return RotationDecision::Rotate;
        }
        if self.parent.as_deref() == Some(presented) {
            return if self.current_confirmed {
                RotationDecision::Theft
            } else {
                RotationDecision::Reuse
            };
        }
        if self.retired.contains(presented) {
            return RotationDecision::Theft;
        }
        RotationDecision::Reuse
    }

    /// Replaces the current token with `next_hash`.
    ///
    /// Only valid after [`classify`](Self::classify) returned
    /// [`RotationDecision::Rotate`] under the same lock.
    pub fn advance(&mut self, next_hash: String) {
        if let Some(parent) = self.parent.take() {
            self.retired.insert(parent);
        }
        let consumed = std::mem::replace(&mut self.current, next_hash);
        self.parent = Some(consumed);
        self.current_confirmed = false;
    }

    /// Marks the current token as confirmed if `parent_hash` is its parent.
    ///
    /// Returns `true` if the lineage changed.
    pub fn confirm(&mut self, parent_hash: &str) -> bool {
        if self.state == LineageState::Active
            && !self.current_confirmed
            && self.parent.as_deref() == Some(parent_hash)
        {
            self.current_confirmed = true;
            return true;
        }
        false
    }

    /// Ends the lineage. Every later presentation is rejected.
    pub fn terminate(&mut self) {
        self.state = LineageState::Terminated;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LineageState {
        self.state
    }

    /// Hash of the only token that may currently be refreshed.
    pub fn current_hash(&self) -> &str {
        &self.current
    }

    /// Whether the current token has been seen in use.
    pub fn is_current_confirmed(&self) -> bool {
        self.current_confirmed
    }
}
