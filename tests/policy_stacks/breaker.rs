//! Circuit breakers compiled from JSON.

use super::test_utils::*;
use faultline_core::PolicyError;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn opens_after_consecutive_failures_and_half_opens_once() {
    let backend = Scripted::statuses(&[500, 500, 200]);
    let breaker = policy(
        "breaker",
        r#"{"type":"CircuitBreaker","policy":{"breakDuration":1,"faultTolerance":2}}"#,
    );
    let svc = breaker.wrap(backend.service());

    for _ in 0..2 {
        let response = svc.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status, 500);
    }

    let rejected = svc.clone().oneshot(request()).await;
    assert!(matches!(rejected, Err(PolicyError::CircuitOpen { .. })));
    assert_eq!(backend.calls(), 2);

    tokio::time::advance(Duration::from_secs(1)).await;

    let trial = svc.clone().oneshot(request()).await.unwrap();
    assert_eq!(trial.status, 200);
    assert_eq!(backend.calls(), 3);

    let closed = svc.clone().oneshot(request()).await.unwrap();
    assert_eq!(closed.status, 200);
}

#[tokio::test(start_paused = true)]
async fn failed_trial_reopens() {
    let backend = Scripted::new(vec![Err(PolicyError::transport("reset"))]);
    let breaker = policy(
        "breaker",
        r#"{"type":"CircuitBreaker","policy":{"breakDuration":0.5,"faultTolerance":1}}"#,
    );
    let svc = breaker.wrap(backend.service());

    assert!(svc.clone().oneshot(request()).await.unwrap_err().is_transport());
    assert!(svc.clone().oneshot(request()).await.unwrap_err().is_circuit_open());

    tokio::time::advance(Duration::from_millis(500)).await;
    assert!(svc.clone().oneshot(request()).await.unwrap_err().is_transport());
    assert!(svc.clone().oneshot(request()).await.unwrap_err().is_circuit_open());
    assert_eq!(backend.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn advanced_breaker_waits_for_minimum_throughput() {
    let backend = Scripted::statuses(&[500]);
    let breaker = policy(
        "ratio",
        r#"{"type":"AdvancedCircuitBreaker","policy":{
            "breakDuration":5,"failureThreshold":0.5,"samplingDuration":10,"minimumThroughput":4}}"#,
    );
    let svc = breaker.wrap(backend.service());

    for _ in 0..4 {
        assert_eq!(svc.clone().oneshot(request()).await.unwrap().status, 500);
    }
    assert!(svc.clone().oneshot(request()).await.unwrap_err().is_circuit_open());
    assert_eq!(backend.calls(), 4);
}

#[tokio::test]
async fn shared_policy_shares_one_circuit() {
    let breaker = policy(
        "shared",
        r#"{"type":"CircuitBreaker","policy":{"breakDuration":30,"faultTolerance":1}}"#,
    );
    let failing = Scripted::statuses(&[500]);
    let healthy = Scripted::statuses(&[200]);

    breaker.wrap(failing.service()).oneshot(request()).await.unwrap();
    let result = breaker.wrap(healthy.service()).oneshot(request()).await;

    assert!(matches!(result, Err(PolicyError::CircuitOpen { .. })));
    assert_eq!(healthy.calls(), 0);
}
