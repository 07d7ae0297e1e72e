//! Stacking order changes behaviour: the first listed policy is outermost.

use super::test_utils::*;
use faultline_core::{HttpResponse, Policy, PolicyError};
use std::time::Duration;
use tower::ServiceExt;

fn stack(policies: Vec<Policy>) -> Policy {
    Policy::wrap_all("stack", policies).unwrap()
}

#[tokio::test(start_paused = true)]
async fn retry_outside_timeout_retries_each_timeout() {
    let backend = Scripted::statuses(&[200]).with_latency(Duration::from_secs(2));
    let retry = policy("retry", r#"{"type":"Retry","policy":{"retries":2}}"#);
    let timeout = policy("timeout", r#"{"type":"Timeout","policy":{"timeoutInSeconds":1}}"#);

    let result = stack(vec![retry, timeout]).wrap(backend.service()).oneshot(request()).await;

    assert!(matches!(result, Err(PolicyError::Timeout { .. })));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn timeout_outside_retry_bounds_the_whole_call() {
    let backend = Scripted::statuses(&[200]).with_latency(Duration::from_secs(2));
    let retry = policy("retry", r#"{"type":"Retry","policy":{"retries":2}}"#);
    let timeout = policy("timeout", r#"{"type":"Timeout","policy":{"timeoutInSeconds":1}}"#);

    let result = stack(vec![timeout, retry]).wrap(backend.service()).oneshot(request()).await;

    assert!(matches!(result, Err(PolicyError::Timeout { .. })));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn fallback_outside_breaker_hides_open_circuit() {
    let backend = Scripted::statuses(&[500]);
    let fallback = policy(
        "fallback",
        r#"{"type":"Fallback","policy":{"status":203,"reason":"Cached","content":"{\"stale\":true}"}}"#,
    );
    let breaker = policy(
        "breaker",
        r#"{"type":"CircuitBreaker","policy":{"breakDuration":60,"faultTolerance":1}}"#,
    );
    let svc = stack(vec![fallback, breaker]).wrap(backend.service());

    for _ in 0..3 {
        let response = svc.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status, 203);
        assert_eq!(response.reason.as_deref(), Some("Cached"));
        assert_eq!(&response.body[..], br#"{"stale":true}"#);
    }
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn fallback_leaves_success_alone() {
    let backend = Scripted::new(vec![Ok(HttpResponse::new(201).with_body("created"))]);
    let fallback = policy("fallback", r#"{"type":"Fallback","policy":{"status":200}}"#);

    let response = fallback.wrap(backend.service()).oneshot(request()).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(&response.body[..], b"created");
}
