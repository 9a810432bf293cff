//! Refresh rotation, reuse, and theft detection through the session manager.

mod common;

use chrono::Duration;

use sessionward_core::ErrorKind;
use sessionward_core::config::SessionConfig;
use sessionward_core::events::SessionEvent;
use sessionward_core::types::{Payload, UserId};

use common::{harness, payload};

#[tokio::test]
async fn test_replayed_refresh_token_kills_lineage() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();

    let s1 = ops
        .create_new_session(&UserId::new("u1"), payload(&[("role", "user")]), Payload::new())
        .await
        .unwrap();
    let a1 = ops
        .get_session(s1.access_token.as_str(), s1.anti_csrf_token.as_deref(), true)
        .await
        .unwrap();
    assert_eq!(a1.user_id.as_str(), "u1");

    let s2 = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap();
    assert_ne!(s2.access_token, s1.access_token);
    assert_ne!(s2.refresh_token, s1.refresh_token);

    // The client switches to A2; its first use confirms R2
    let a2 = ops
        .get_session(s2.access_token.as_str(), s2.anti_csrf_token.as_deref(), true)
        .await
        .unwrap();
    let confirmed = a2.new_access_token.expect("confirmation re-issues the access token");
    let again = ops
        .get_session(confirmed.as_str(), s2.anti_csrf_token.as_deref(), true)
        .await
        .unwrap();
    assert!(again.new_access_token.is_none());

    let err = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::TokenTheftDetected));
    let affected = err.session.expect("theft names the session");
    assert_eq!(affected.session_handle, s1.session_handle);
    assert_eq!(affected.user_id.as_str(), "u1");

    let err = ops
        .refresh_session(s2.refresh_token.as_str(), s2.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));

    assert!(h.events.events().contains(&SessionEvent::TokenTheftDetected {
        session_handle: s1.session_handle.clone(),
        user_id: UserId::new("u1"),
    }));
}

#[tokio::test]
async fn test_double_refresh_is_reuse_not_theft() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    let s2 = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap();
    let err = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));

    // The session survives the lost race
    assert!(
        ops.refresh_session(s2.refresh_token.as_str(), s2.anti_csrf_token.as_deref())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_token_from_two_rotations_ago_is_theft() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();
    let s2 = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap();
    let s3 = ops
        .refresh_session(s2.refresh_token.as_str(), s2.anti_csrf_token.as_deref())
        .await
        .unwrap();

    let err = ops
        .refresh_session(s1.refresh_token.as_str(), None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::TokenTheftDetected));

    let err = ops
        .refresh_session(s3.refresh_token.as_str(), s3.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_wrong_anti_csrf_does_not_rotate() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    for presented in [Some("wrong"), None] {
        let err = ops
            .refresh_session(s1.refresh_token.as_str(), presented)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::AntiCsrfMismatch));
    }

    let s2 = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap();
    assert_ne!(s2.anti_csrf_token, s1.anti_csrf_token);

    // The old anti-CSRF value dies with the old refresh token
    let err = ops
        .get_session(s2.access_token.as_str(), s1.anti_csrf_token.as_deref(), true)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::AntiCsrfMismatch));
}

#[tokio::test]
async fn test_access_token_valid_until_expiry() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(3599));
    assert!(ops.get_session(s1.access_token.as_str(), None, false).await.is_ok());

    h.clock.advance(Duration::seconds(1));
    let err = ops
        .get_session(s1.access_token.as_str(), None, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::TryRefreshToken));
}

#[tokio::test]
async fn test_revocation_and_staleness_window() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    assert!(ops.revoke_session(&s1.session_handle).await.unwrap());
    assert!(!ops.revoke_session(&s1.session_handle).await.unwrap());

    // Signature-only verification keeps accepting the access token
    assert!(ops.get_session(s1.access_token.as_str(), None, false).await.is_ok());

    let err = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));
}

#[tokio::test]
async fn test_session_expires_after_refresh_ttl_idle() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    h.clock.advance(Duration::days(100));
    let err = ops
        .refresh_session(s1.refresh_token.as_str(), s1.anti_csrf_token.as_deref())
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::UnauthorisedTokenReuse));
}

#[tokio::test]
async fn test_malformed_refresh_token() {
    let h = harness(SessionConfig::default());
    let err = h
        .recipe
        .operations()
        .refresh_session("definitely-not-a-token", None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::MalformedToken));
}
