//! Shared test helpers for sessionward-api integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use serde_json::Value;
use tower::ServiceExt;

use sessionward_api::handlers::session::session_info;
use sessionward_api::{ApiState, build_router};
use sessionward_auth::{IssuedSession, MemorySessionStore, SessionRecipe, SessionRecipeBuilder};
use sessionward_core::config::{CorsConfig, SessionConfig, TokenConfig};
use sessionward_core::traits::ManualClock;
use sessionward_core::types::{Payload, UserId};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The recipe behind the router
    pub recipe: Arc<SessionRecipe>,
    /// Session store for direct inspection
    pub store: MemorySessionStore,
    /// Time source shared with the recipe
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Create a new test application
    pub fn new(session: SessionConfig) -> Self {
        Self::with_state(session, |state| state)
    }

    /// Create a test application, adjusting the state before routing
    pub fn with_state(session: SessionConfig, customise: impl FnOnce(ApiState) -> ApiState) -> Self {
        let token = TokenConfig::default();
        let clock = Arc::new(ManualClock::starting_now());
        let store = MemorySessionStore::new(
            token.refresh_ttl().expect("Default refresh lifetime"),
            clock.clone(),
        );
        let recipe = Arc::new(
            SessionRecipeBuilder::new(token, session, Arc::new(store.clone()))
                .clock(clock.clone())
                .build()
                .expect("Failed to build recipe"),
        );

        let state = customise(ApiState::new(recipe.clone()));
        let app_routes = Router::new().route("/sessioninfo", get(session_info).post(session_info));
        let router = build_router(state, app_routes, &CorsConfig::default());

        Self {
            router,
            recipe,
            store,
            clock,
        }
    }

    /// Start a session for `user` with an empty payload
    pub async fn sign_in(&self, user: &str) -> IssuedSession {
        self.recipe
            .operations()
            .create_new_session(&UserId::new(user), Payload::new(), Payload::new())
            .await
            .expect("Failed to create session")
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, headers: &[(&str, String)]) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `status` field of the body
    pub fn status_field(&self) -> &str {
        self.body.get("status").and_then(Value::as_str).unwrap_or("")
    }

    /// Value of a `Set-Cookie` for `name`, if one was sent
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&format!("{name}=")))
            .map(|c| {
                let pair = c.split(';').next().unwrap_or_default();
                pair[name.len() + 1..].to_string()
            })
    }

    /// Every `Set-Cookie` header, raw
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    /// A response header as a string
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

/// `Cookie` header carrying the given pairs
pub fn cookies(pairs: &[(&str, &str)]) -> (&'static str, String) {
    let value = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ");
    ("cookie", value)
}

/// `anti-csrf` header for an issued session
pub fn anti_csrf(issued: &IssuedSession) -> (&'static str, String) {
    (
        "anti-csrf",
        issued.anti_csrf_token.clone().unwrap_or_default(),
    )
}
