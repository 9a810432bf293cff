//! Concurrent refreshes of one token must produce exactly one winner.

mod common;

use futures::future::join_all;

use sessionward_core::ErrorKind;
use sessionward_core::config::SessionConfig;
use sessionward_core::types::{Payload, UserId};

use common::harness;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_concurrent_refresh_wins() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();
    let s1 = ops
        .create_new_session(&UserId::new("u1"), Payload::new(), Payload::new())
        .await
        .unwrap();

    let attempts = (0..16).map(|_| {
        let ops = ops.clone();
        let refresh = s1.refresh_token.as_str().to_string();
        let csrf = s1.anti_csrf_token.clone();
        tokio::spawn(async move { ops.refresh_session(&refresh, csrf.as_deref()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        let err = result.as_ref().unwrap_err();
        assert!(err.is(ErrorKind::UnauthorisedTokenReuse), "got {err}");
    }

    // Losing the race did not terminate the session
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_verification_of_many_sessions() {
    let h = harness(SessionConfig::default());
    let ops = h.recipe.operations();

    let mut issued = Vec::new();
    for i in 0..8 {
        issued.push(
            ops.create_new_session(&UserId::new(format!("u{i}")), Payload::new(), Payload::new())
                .await
                .unwrap(),
        );
    }

    let checks = issued.iter().map(|s| {
        let ops = ops.clone();
        let token = s.access_token.as_str().to_string();
        let expected = s.user_id.clone();
        tokio::spawn(async move {
            let session = ops.get_session(&token, None, false).await.unwrap();
            assert_eq!(session.user_id, expected);
        })
    });
    for joined in join_all(checks).await {
        joined.unwrap();
    }
}
