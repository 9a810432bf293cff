//! CORS layer configuration.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use sessionward_auth::SessionRecipe;
use sessionward_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Session cookies need credentialed requests, so origins are never a
/// wildcard: `*` mirrors the request origin instead. The session headers
/// are allowed and exposed on top of the configured ones.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let allowed: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .map(String::as_str)
        .chain(SessionRecipe::cors_allowed_headers().iter().copied())
        .filter_map(|h| h.parse().ok())
        .collect();

    let exposed: Vec<HeaderName> = SessionRecipe::cors_exposed_headers()
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(allowed)
        .expose_headers(exposed)
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
