//! `VerifiedSession` extractor: verifies the presented access token and
//! injects the session into handlers.

use axum::extract::FromRequestParts;
use axum::http::Method;
use axum::http::request::Parts;

use sessionward_auth::SessionContainer;
use sessionward_core::error::AppError;

use crate::error::ApiError;
use crate::middleware::session::ReissuedAccessToken;
use crate::state::ApiState;
use crate::transport::{self, TokenTransport};

/// A session whose access token verified for this request.
///
/// Anti-CSRF is enforced for every method except `GET`, `HEAD` and
/// `OPTIONS`. When verification issued a replacement access token it is
/// handed to [`attach_reissued_tokens`](crate::middleware::session::attach_reissued_tokens)
/// for the response; without that middleware the client keeps its old
/// token and the replacement is issued again next time.
#[derive(Debug, Clone)]
pub struct VerifiedSession(pub SessionContainer);

impl VerifiedSession {
    /// Returns the inner `SessionContainer`.
    pub fn container(&self) -> &SessionContainer {
        &self.0
    }
}

impl std::ops::Deref for VerifiedSession {
    type Target = SessionContainer;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<ApiState> for VerifiedSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let transport = TokenTransport::for_request(
            state.recipe.session_config(),
            state.recipe.now(),
            &parts.headers,
        );
        let access_token = transport
            .access_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorised("Access token not found"))?;

        let do_anti_csrf_check = ![Method::GET, Method::HEAD, Method::OPTIONS].contains(&parts.method);
        if do_anti_csrf_check {
            state
                .recipe
                .anti_csrf()
                .verify_custom_header(transport::has_rid(&parts.headers))?;
        }

        let session = state
            .recipe
            .operations()
            .get_session(
                &access_token,
                transport::anti_csrf_token(&parts.headers).as_deref(),
                do_anti_csrf_check,
            )
            .await?;

        if session.new_access_token.is_some() {
            if let Some(slot) = parts.extensions.get::<ReissuedAccessToken>() {
                slot.offer(&session);
            }
        }

        Ok(VerifiedSession(session))
    }
}
