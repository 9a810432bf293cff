//! Wrapping the endpoint logic through `ApiState::override_apis`.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::StatusCode;

use sessionward_api::SessionApis;
use sessionward_api::apis::{RefreshRequest, SignoutOutcome, SignoutRequest};
use sessionward_auth::IssuedSession;
use sessionward_core::config::SessionConfig;
use sessionward_core::error::AppError;

use common::{TestApp, anti_csrf, cookies};

/// Counts refreshes and refuses signout outright.
struct Audited {
    inner: Arc<dyn SessionApis>,
    refreshes: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionApis for Audited {
    async fn refresh_post(&self, request: RefreshRequest) -> Result<IssuedSession, AppError> {
        let issued = self.inner.refresh_post(request).await?;
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(issued)
    }

    async fn signout_post(&self, _request: SignoutRequest) -> Result<SignoutOutcome, AppError> {
        Err(AppError::bad_input("Signout is disabled for this tenant"))
    }
}

#[tokio::test]
async fn test_override_wraps_default_apis() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = refreshes.clone();
    let app = TestApp::with_state(SessionConfig::default(), move |state| {
        state.override_apis(move |inner| {
            let wrapped: Arc<dyn SessionApis> = Arc::new(Audited {
                inner,
                refreshes: counter,
            });
            wrapped
        })
    });
    let s1 = app.sign_in("u1").await;

    let res = app
        .request(
            "POST",
            "/auth/session/refresh",
            &[
                cookies(&[("sRefreshToken", s1.refresh_token.as_str())]),
                anti_csrf(&s1),
            ],
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    let res = app
        .request(
            "POST",
            "/auth/signout",
            &[cookies(&[("sAccessToken", s1.access_token.as_str())])],
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.status_field(), "BAD_INPUT");
    assert!(res.set_cookies().is_empty());
}
