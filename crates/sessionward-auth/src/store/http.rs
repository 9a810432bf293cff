//! HTTP client for a remote session core.
//!
//! Every reply is JSON carrying a `status` discriminator. Transport
//! failures, timeouts, and 5xx replies surface as `CoreUnavailable` and
//! are never retried: a retried refresh could rotate twice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use sessionward_core::config::CoreConfig;
use sessionward_core::error::AppError;
use sessionward_core::types::{Payload, Session, SessionHandle, UserId};

use super::{SessionGrant, SessionStore};
use crate::refresh::RefreshTokenHandle;
use crate::tokens::RefreshToken;

const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    user_id: &'a UserId,
    #[serde(rename = "userDataInJWT")]
    user_data_in_jwt: &'a Payload,
    user_data_in_database: &'a Payload,
    enable_anti_csrf: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    anti_csrf_token: Option<&'a str>,
    enable_anti_csrf: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    session_handle: &'a SessionHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_refresh_token_hash1: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RemoveRequest<'a> {
    SessionHandles(Vec<&'a SessionHandle>),
    UserId(&'a UserId),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDataRequest<'a> {
    session_handle: &'a SessionHandle,
    user_data_in_database: &'a Payload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JwtDataRequest<'a> {
    session_handle: &'a SessionHandle,
    #[serde(rename = "userDataInJWT")]
    user_data_in_jwt: &'a Payload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum GrantReply {
    #[serde(rename_all = "camelCase")]
    Ok {
        session: Session,
        refresh_token: String,
        #[serde(default)]
        anti_csrf_token: Option<String>,
    },
    Unauthorised,
    #[serde(rename_all = "camelCase")]
    TokenTheftDetected {
        session_handle: SessionHandle,
        user_id: UserId,
    },
    AntiCsrfMismatch,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum SessionReply {
    Ok { session: Session },
    Unauthorised,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum RevokeReply {
    #[serde(rename_all = "camelCase")]
    Ok {
        session_handles_revoked: Vec<SessionHandle>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum HandlesReply {
    #[serde(rename_all = "camelCase")]
    Ok { session_handles: Vec<SessionHandle> },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum SessionDataReply {
    #[serde(rename_all = "camelCase")]
    Ok { user_data_in_database: Payload },
    Unauthorised,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum JwtDataReply {
    Ok {
        #[serde(rename = "userDataInJWT")]
        user_data_in_jwt: Payload,
    },
    Unauthorised,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum UpdateReply {
    Ok,
    Unauthorised,
}

/// Session core reached over HTTP.
#[derive(Debug, Clone)]
pub struct CoreClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoreClient {
    /// Builds a client with the configured base URL, API key, and timeout.
    pub fn new(config: &CoreConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sessionward/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build core HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.connection_uri.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and decodes the status-tagged reply.
    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, AppError> {
        let request = match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Session core request failed");
            AppError::core_unavailable(format!("Session core unreachable: {e}"))
        })?;

        let status = response.status();
        trace!(status = %status, "Session core response");

        if status.is_server_error() {
            return Err(AppError::core_unavailable(format!(
                "Session core returned {status}"
            )));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::configuration(format!(
                "Session core rejected the API key ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::internal(format!(
                "Session core returned {status}: {body}"
            )));
        }

        response.json::<R>().await.map_err(|e| {
            AppError::internal(format!("Session core reply could not be decoded: {e}"))
        })
    }
}

fn missing(handle: &SessionHandle) -> AppError {
    AppError::session_not_found(format!("Session {handle} does not exist"))
}

#[async_trait]
impl SessionStore for CoreClient {
    #[instrument(skip_all, fields(core = %self.base_url, user_id = %user_id))]
    async fn create_session(
        &self,
        user_id: &UserId,
        user_data_in_jwt: Payload,
        user_data_in_database: Payload,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError> {
        debug!("Creating session in core");
        let body = CreateRequest {
            user_id,
            user_data_in_jwt: &user_data_in_jwt,
            user_data_in_database: &user_data_in_database,
            enable_anti_csrf,
        };
        let reply: GrantReply = self
            .send(self.client.post(self.url("/recipe/session")).json(&body))
            .await?;

        match reply {
            GrantReply::Ok {
                session,
                refresh_token,
                anti_csrf_token,
            } => Ok(SessionGrant {
                session,
                refresh_token: RefreshToken::new(refresh_token),
                anti_csrf_token,
            }),
            other => Err(AppError::internal(format!(
                "Unexpected core reply to session creation: {other:?}"
            ))),
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %refresh_token.session_handle))]
    async fn refresh_session(
        &self,
        refresh_token: &RefreshTokenHandle,
        anti_csrf_token: Option<&str>,
        enable_anti_csrf: bool,
    ) -> Result<SessionGrant, AppError> {
        debug!("Refreshing session in core");
        let body = RefreshRequest {
            refresh_token: refresh_token.token.as_str(),
            anti_csrf_token,
            enable_anti_csrf,
        };
        let reply: GrantReply = self
            .send(
                self.client
                    .post(self.url("/recipe/session/refresh"))
                    .json(&body),
            )
            .await?;

        match reply {
            GrantReply::Ok {
                session,
                refresh_token,
                anti_csrf_token,
            } => Ok(SessionGrant {
                session,
                refresh_token: RefreshToken::new(refresh_token),
                anti_csrf_token,
            }),
            GrantReply::Unauthorised => Err(AppError::token_reuse(
                "Refresh token does not belong to a live lineage",
            )),
            GrantReply::TokenTheftDetected {
                session_handle,
                user_id,
            } => Err(AppError::token_theft(session_handle, user_id)),
            GrantReply::AntiCsrfMismatch => {
                Err(AppError::anti_csrf_mismatch("Anti-CSRF token mismatch"))
            }
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn verify_session(
        &self,
        session_handle: &SessionHandle,
        parent_refresh_token_hash1: Option<&str>,
    ) -> Result<Session, AppError> {
        let body = VerifyRequest {
            session_handle,
            parent_refresh_token_hash1,
        };
        let reply: SessionReply = self
            .send(
                self.client
                    .post(self.url("/recipe/session/verify"))
                    .json(&body),
            )
            .await?;

        match reply {
            SessionReply::Ok { session } => Ok(session),
            SessionReply::Unauthorised => Err(missing(session_handle)),
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn revoke_session(&self, session_handle: &SessionHandle) -> Result<bool, AppError> {
        let body = RemoveRequest::SessionHandles(vec![session_handle]);
        let reply: RevokeReply = self
            .send(
                self.client
                    .post(self.url("/recipe/session/remove"))
                    .json(&body),
            )
            .await?;
        let RevokeReply::Ok {
            session_handles_revoked,
        } = reply;
        Ok(session_handles_revoked.contains(session_handle))
    }

    #[instrument(skip_all, fields(core = %self.base_url, user_id = %user_id))]
    async fn revoke_all_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        let body = RemoveRequest::UserId(user_id);
        let reply: RevokeReply = self
            .send(
                self.client
                    .post(self.url("/recipe/session/remove"))
                    .json(&body),
            )
            .await?;
        let RevokeReply::Ok {
            session_handles_revoked,
        } = reply;
        Ok(session_handles_revoked)
    }

    #[instrument(skip_all, fields(core = %self.base_url, user_id = %user_id))]
    async fn get_all_session_handles_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<SessionHandle>, AppError> {
        let reply: HandlesReply = self
            .send(
                self.client
                    .get(self.url("/recipe/session/user"))
                    .query(&[("userId", user_id.as_str())]),
            )
            .await?;
        let HandlesReply::Ok { session_handles } = reply;
        Ok(session_handles)
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn get_session_data(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        let reply: SessionDataReply = self
            .send(
                self.client
                    .get(self.url("/recipe/session/data"))
                    .query(&[("sessionHandle", session_handle.as_str())]),
            )
            .await?;
        match reply {
            SessionDataReply::Ok {
                user_data_in_database,
            } => Ok(user_data_in_database),
            SessionDataReply::Unauthorised => Err(missing(session_handle)),
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn update_session_data(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        let body = SessionDataRequest {
            session_handle,
            user_data_in_database: &data,
        };
        let reply: UpdateReply = self
            .send(self.client.put(self.url("/recipe/session/data")).json(&body))
            .await?;
        match reply {
            UpdateReply::Ok => Ok(()),
            UpdateReply::Unauthorised => Err(missing(session_handle)),
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn get_jwt_payload(&self, session_handle: &SessionHandle) -> Result<Payload, AppError> {
        let reply: JwtDataReply = self
            .send(
                self.client
                    .get(self.url("/recipe/jwt/data"))
                    .query(&[("sessionHandle", session_handle.as_str())]),
            )
            .await?;
        match reply {
            JwtDataReply::Ok { user_data_in_jwt } => Ok(user_data_in_jwt),
            JwtDataReply::Unauthorised => Err(missing(session_handle)),
        }
    }

    #[instrument(skip_all, fields(core = %self.base_url, session_handle = %session_handle))]
    async fn update_jwt_payload(
        &self,
        session_handle: &SessionHandle,
        data: Payload,
    ) -> Result<(), AppError> {
        let body = JwtDataRequest {
            session_handle,
            user_data_in_jwt: &data,
        };
        let reply: UpdateReply = self
            .send(self.client.put(self.url("/recipe/jwt/data")).json(&body))
            .await?;
        match reply {
            UpdateReply::Ok => Ok(()),
            UpdateReply::Unauthorised => Err(missing(session_handle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_request_shapes() {
        let handle = SessionHandle::new("h1");
        let json = serde_json::to_value(RemoveRequest::SessionHandles(vec![&handle])).unwrap();
        assert_eq!(json, serde_json::json!({ "sessionHandles": ["h1"] }));

        let user = UserId::new("u1");
        let json = serde_json::to_value(RemoveRequest::UserId(&user)).unwrap();
        assert_eq!(json, serde_json::json!({ "userId": "u1" }));
    }

    #[test]
    fn test_grant_reply_statuses() {
        let reply: GrantReply = serde_json::from_value(serde_json::json!({
            "status": "TOKEN_THEFT_DETECTED",
            "sessionHandle": "h1",
            "userId": "u1"
        }))
        .unwrap();
        assert!(matches!(reply, GrantReply::TokenTheftDetected { .. }));

        let reply: GrantReply = serde_json::from_value(serde_json::json!({
            "status": "UNAUTHORISED",
            "message": "unknown"
        }))
        .unwrap();
        assert!(matches!(reply, GrantReply::Unauthorised));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = CoreConfig {
            connection_uri: "http://core.local:3567/".into(),
            ..CoreConfig::default()
        };
        let client = CoreClient::new(&config).unwrap();
        assert_eq!(client.url("/recipe/session"), "http://core.local:3567/recipe/session");
    }
}
