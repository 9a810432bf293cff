//! Session handlers: refresh, signout, and session info.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use sessionward_auth::{AccessToken, RefreshToken};
use sessionward_core::error::ErrorKind;

use crate::apis::{RefreshRequest, SignoutOutcome, SignoutRequest};
use crate::dto::{SessionInfoResponse, StatusResponse};
use crate::error::ApiError;
use crate::extractors::VerifiedSession;
use crate::state::ApiState;
use crate::transport::{self, TokenTransport};

/// POST <api base><refresh path>
///
/// On success the new token pair replaces the client's. Failures that end
/// the session also clear the client's tokens; anti-CSRF failures and core
/// outages leave them in place so a retry can succeed.
pub async fn refresh(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let transport = TokenTransport::for_request(state.recipe.session_config(), state.recipe.now(), &headers);
    let request = RefreshRequest {
        refresh_token: transport.refresh_token(&headers).map(RefreshToken::new),
        anti_csrf_token: transport::anti_csrf_token(&headers),
        has_rid: transport::has_rid(&headers),
    };

    let mut out = HeaderMap::new();
    match state.apis.refresh_post(request).await {
        Ok(issued) => {
            transport.attach_issued(&mut out, &issued)?;
            Ok((out, Json(StatusResponse::ok())).into_response())
        }
        Err(err) => {
            if err.is(ErrorKind::TokenTheftDetected) {
                if let Some(affected) = &err.session {
                    warn!(
                        session_handle = %affected.session_handle,
                        user_id = %affected.user_id,
                        "Refresh rejected: token theft"
                    );
                }
            }
            if err.kind.is_terminal_for_refresh() {
                transport.clear(&mut out)?;
            }
            Ok((out, ApiError(err)).into_response())
        }
    }
}

/// POST <api base><signout path>
///
/// Idempotent: a missing or already revoked session still answers `OK`
/// and clears the client's tokens. An expired access token answers
/// `TRY_REFRESH_TOKEN` so the client refreshes and signs out again.
pub async fn signout(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let transport = TokenTransport::for_request(state.recipe.session_config(), state.recipe.now(), &headers);
    let request = SignoutRequest {
        access_token: transport.access_token(&headers).map(AccessToken::new),
        anti_csrf_token: transport::anti_csrf_token(&headers),
        has_rid: transport::has_rid(&headers),
    };

    let outcome = state.apis.signout_post(request).await?;
    if outcome == SignoutOutcome::AlreadySignedOut {
        info!("Signout without a live session");
    }

    let mut out = HeaderMap::new();
    transport.clear(&mut out)?;
    Ok((out, Json(StatusResponse::ok())).into_response())
}

/// GET /sessioninfo
pub async fn session_info(session: VerifiedSession) -> Json<SessionInfoResponse> {
    Json(SessionInfoResponse::from(session.container()))
}
