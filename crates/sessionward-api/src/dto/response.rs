//! Response DTOs.

use serde::{Deserialize, Serialize};

use sessionward_auth::SessionContainer;
use sessionward_core::types::Payload;

/// `{"status": "OK"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"OK"` on success.
    pub status: String,
}

impl StatusResponse {
    /// The success body.
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"OK"` while serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// The verified session, as shown to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    /// Session handle.
    pub session_handle: String,
    /// User id.
    pub user_id: String,
    /// JWT payload.
    pub access_token_payload: Payload,
}

impl From<&SessionContainer> for SessionInfoResponse {
    fn from(session: &SessionContainer) -> Self {
        Self {
            session_handle: session.session_handle.as_str().to_string(),
            user_id: session.user_id.as_str().to_string(),
            access_token_payload: session.user_data_in_jwt.clone(),
        }
    }
}
