//! Cache compiled from JSON.

use super::test_utils::*;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn sliding_entries_live_while_read() {
    let backend = Scripted::statuses(&[200]);
    let cache = policy(
        "sliding",
        r#"{"type":"Cache","policy":{"time":{"seconds":10},"sliding":true}}"#,
    );
    let svc = cache.wrap(backend.service());

    svc.clone().oneshot(keyed_request("orders")).await.unwrap();
    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(8)).await;
        svc.clone().oneshot(keyed_request("orders")).await.unwrap();
    }
    assert_eq!(backend.calls(), 1);

    tokio::time::advance(Duration::from_secs(11)).await;
    svc.clone().oneshot(keyed_request("orders")).await.unwrap();
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let backend = Scripted::statuses(&[500, 200]);
    let cache = policy("c", r#"{"type":"Cache","policy":{"time":{"minutes":1}}}"#);
    let svc = cache.wrap(backend.service());

    assert_eq!(svc.clone().oneshot(keyed_request("k")).await.unwrap().status, 500);
    assert_eq!(svc.clone().oneshot(keyed_request("k")).await.unwrap().status, 200);
    assert_eq!(svc.clone().oneshot(keyed_request("k")).await.unwrap().status, 200);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn keys_are_independent() {
    let backend = Scripted::statuses(&[200]);
    let cache = policy("c", r#"{"type":"Cache","policy":{"time":{"hours":1}}}"#);
    let svc = cache.wrap(backend.service());

    for key in ["a", "b", "a", "b"] {
        svc.clone().oneshot(keyed_request(key)).await.unwrap();
    }
    assert_eq!(backend.calls(), 2);
}
