//! `CoreClient` against a mocked session core.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sessionward_auth::refresh::RefreshTokenHandle;
use sessionward_auth::{CoreClient, SessionStore};
use sessionward_core::ErrorKind;
use sessionward_core::config::CoreConfig;
use sessionward_core::types::{Payload, SessionHandle, UserId};

fn client(server: &MockServer) -> CoreClient {
    CoreClient::new(&CoreConfig {
        connection_uri: server.uri(),
        api_key: Some("test-key".into()),
        timeout_ms: 500,
        ..CoreConfig::default()
    })
    .unwrap()
}

fn session_json(handle: &str) -> serde_json::Value {
    json!({
        "handle": handle,
        "userId": "u1",
        "userDataInJWT": { "role": "admin" },
        "expiryTime": 1_900_000_000_000i64
    })
}

fn refresh_handle() -> RefreshTokenHandle {
    RefreshTokenHandle::parse("v1.h1.c2VjcmV0").unwrap()
}

#[tokio::test]
async fn test_create_session_sends_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session"))
        .and(header("api-key", "test-key"))
        .and(body_json(json!({
            "userId": "u1",
            "userDataInJWT": {},
            "userDataInDatabase": {},
            "enableAntiCsrf": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "session": session_json("h1"),
            "refreshToken": "v1.h1.c2VjcmV0",
            "antiCsrfToken": "csrf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client(&server)
        .create_session(&UserId::new("u1"), Payload::new(), Payload::new(), true)
        .await
        .unwrap();

    assert_eq!(grant.session.handle.as_str(), "h1");
    assert_eq!(grant.refresh_token.as_str(), "v1.h1.c2VjcmV0");
    assert_eq!(grant.anti_csrf_token.as_deref(), Some("csrf"));
    assert_eq!(grant.session.user_data_in_jwt["role"], "admin");
}

#[tokio::test]
async fn test_refresh_maps_theft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "TOKEN_THEFT_DETECTED",
            "sessionHandle": "h1",
            "userId": "u1"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .refresh_session(&refresh_handle(), None, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::TokenTheftDetected));
    let affected = err.session.unwrap();
    assert_eq!(affected.session_handle.as_str(), "h1");
    assert_eq!(affected.user_id.as_str(), "u1");
}

#[tokio::test]
async fn test_refresh_maps_unauthorised_and_csrf() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/refresh"))
        .and(body_json(json!({
            "refreshToken": "v1.h1.c2VjcmV0",
            "antiCsrfToken": "bad",
            "enableAntiCsrf": true
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "ANTI_CSRF_MISMATCH" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "UNAUTHORISED",
            "message": "unknown lineage"
        })))
        .mount(&server)
        .await;

    let core = client(&server);
    let err = core
        .refresh_session(&refresh_handle(), Some("bad"), true)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::AntiCsrfMismatch));

    let err = core
        .refresh_session(&refresh_handle(), None, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));
}

#[tokio::test]
async fn test_verify_passes_parent_hash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/verify"))
        .and(body_json(json!({
            "sessionHandle": "h1",
            "parentRefreshTokenHash1": "abc"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "session": session_json("h1")
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/verify"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "UNAUTHORISED" })),
        )
        .mount(&server)
        .await;

    let core = client(&server);
    let session = core
        .verify_session(&SessionHandle::new("h1"), Some("abc"))
        .await
        .unwrap();
    assert_eq!(session.user_id.as_str(), "u1");

    let err = core
        .verify_session(&SessionHandle::new("gone"), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::SessionNotFound));
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/remove"))
        .and(body_json(json!({ "sessionHandles": ["h1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "sessionHandlesRevoked": []
        })))
        .mount(&server)
        .await;

    let revoked = client(&server)
        .revoke_session(&SessionHandle::new("h1"))
        .await
        .unwrap();
    assert!(!revoked);
}

#[tokio::test]
async fn test_user_session_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/session/user"))
        .and(query_param("userId", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "sessionHandles": ["h1", "h2"]
        })))
        .mount(&server)
        .await;

    let handles = client(&server)
        .get_all_session_handles_for_user(&UserId::new("u1"))
        .await
        .unwrap();
    assert_eq!(handles, vec![SessionHandle::new("h1"), SessionHandle::new("h2")]);
}

#[tokio::test]
async fn test_session_data_round_trip_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/session/data"))
        .and(query_param("sessionHandle", "h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "userDataInDatabase": { "cart": 3 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/recipe/jwt/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "UNAUTHORISED" })),
        )
        .mount(&server)
        .await;

    let core = client(&server);
    let data = core.get_session_data(&SessionHandle::new("h1")).await.unwrap();
    assert_eq!(data["cart"], 3);

    let err = core
        .update_jwt_payload(&SessionHandle::new("h1"), Payload::new())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::SessionNotFound));
}

#[tokio::test]
async fn test_server_error_is_core_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/verify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .verify_session(&SessionHandle::new("h1"), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::CoreUnavailable));
}

#[tokio::test]
async fn test_timeout_is_core_unavailable_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "UNAUTHORISED" }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .refresh_session(&refresh_handle(), None, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::CoreUnavailable));
}

#[tokio::test]
async fn test_unreachable_core() {
    let core = CoreClient::new(&CoreConfig {
        connection_uri: "http://127.0.0.1:9".into(),
        timeout_ms: 500,
        ..CoreConfig::default()
    })
    .unwrap();

    let err = core
        .verify_session(&SessionHandle::new("h1"), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::CoreUnavailable));
}

#[tokio::test]
async fn test_undecodable_reply_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipe/session/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .verify_session(&SessionHandle::new("h1"), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Internal));
}
