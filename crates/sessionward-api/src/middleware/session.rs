//! Carries access tokens re-issued during verification onto the response.

use std::sync::{Arc, OnceLock};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use sessionward_auth::SessionContainer;

use crate::state::ApiState;
use crate::transport::TokenTransport;

/// Request-scoped slot the extractor fills with a re-issued token.
#[derive(Debug, Clone, Default)]
pub struct ReissuedAccessToken(Arc<OnceLock<SessionContainer>>);

impl ReissuedAccessToken {
    /// Records `session` if it carries a replacement access token. The
    /// first offer wins.
    pub fn offer(&self, session: &SessionContainer) {
        if session.new_access_token.is_some() {
            let _ = self.0.set(session.clone());
        }
    }

    /// The session whose token was re-issued, if any.
    pub fn get(&self) -> Option<&SessionContainer> {
        self.0.get()
    }
}

/// Attaches a re-issued access token (and front-token) to the response.
pub async fn attach_reissued_tokens(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Response {
    let transport = TokenTransport::for_request(
        state.recipe.session_config(),
        state.recipe.now(),
        request.headers(),
    );
    let slot = ReissuedAccessToken::default();
    request.extensions_mut().insert(slot.clone());

    let mut response = next.run(request).await;

    let Some(session) = slot.get() else {
        return response;
    };
    let Some(token) = &session.new_access_token else {
        return response;
    };
    if let Err(e) = transport.attach_access_token(
        response.headers_mut(),
        token,
        &session.user_id,
        session.access_token_expiry,
        &session.user_data_in_jwt,
    ) {
        warn!(session_handle = %session.session_handle, error = %e, "Failed to attach re-issued access token");
    }
    response
}
