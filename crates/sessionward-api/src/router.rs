//! Route definitions for the Sessionward HTTP API.
//!
//! The recipe's endpoints are mounted at the paths it reports, skipping
//! those configuration disabled. Application routes passed in share the
//! state, so they can use [`VerifiedSession`](crate::extractors::VerifiedSession).

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use sessionward_auth::recipe::{REFRESH_API_ID, SIGNOUT_API_ID};
use sessionward_core::config::CorsConfig;

use crate::handlers;
use crate::middleware;
use crate::state::ApiState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: ApiState, app_routes: Router<ApiState>, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(session_routes(&state))
        .merge(health_routes())
        .merge(app_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session::attach_reissued_tokens,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors::build_cors_layer(cors))
        .with_state(state)
}

/// Refresh and signout, where enabled.
fn session_routes(state: &ApiState) -> Router<ApiState> {
    let mut router = Router::new();
    for api in state.recipe.apis_handled() {
        if api.disabled {
            debug!(path = %api.path, "Endpoint disabled");
            continue;
        }
        router = match api.id {
            REFRESH_API_ID => router.route(&api.path, post(handlers::session::refresh)),
            SIGNOUT_API_ID => router.route(&api.path, post(handlers::session::signout)),
            _ => router,
        };
    }
    router
}

/// Liveness endpoint
fn health_routes() -> Router<ApiState> {
    Router::new().route("/health", get(handlers::health::health))
}
