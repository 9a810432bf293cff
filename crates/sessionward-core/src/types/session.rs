//! The logical session record as held by the remote core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{SessionHandle, UserId};

/// Arbitrary key-valued session payload.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A logical authenticated session.
///
/// The remote core is the only durable owner of this record; access tokens
/// carry a copy of `user_data_in_jwt` taken when they were issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable session identifier.
    pub handle: SessionHandle,
    /// Owning principal.
    pub user_id: UserId,
    /// Payload embedded into every newly issued access token.
    #[serde(rename = "userDataInJWT", default)]
    pub user_data_in_jwt: Payload,
    /// Absolute session expiry; slides forward on every refresh.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry_time: DateTime<Utc>,
}

impl Session {
    /// Checks whether the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }
}
