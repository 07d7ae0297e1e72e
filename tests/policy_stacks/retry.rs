//! Retry compiled from JSON.

use super::test_utils::*;
use faultline_core::PolicyError;
use std::time::Duration;
use tokio::time::Instant;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn retries_forever_below_one() {
    let mut script = vec![Err(PolicyError::transport("refused")); 250];
    script.push(Ok(faultline_core::HttpResponse::new(200)));
    let backend = Scripted::new(script);
    let retry = policy("forever", r#"{"type":"Retry","policy":{"retries":0}}"#);

    let response = retry.wrap(backend.service()).oneshot(request()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(backend.calls(), 251);
}

#[tokio::test(start_paused = true)]
async fn exponential_backoff_doubles() {
    let backend = Scripted::statuses(&[503, 503, 503, 200]);
    let retry = policy(
        "exp",
        r#"{"type":"Retry","policy":{"retries":3,"delaysInSeconds":[-1]}}"#,
    );

    let started = Instant::now();
    let response = retry.wrap(backend.service()).oneshot(request()).await.unwrap();

    assert_eq!(response.status, 200);
    // 2 + 4 + 8 seconds
    assert_eq!(started.elapsed(), Duration::from_secs(14));
}

#[tokio::test(start_paused = true)]
async fn short_delay_list_reuses_last_entry() {
    let backend = Scripted::statuses(&[500, 500, 500, 500, 204]);
    let retry = policy(
        "list",
        r#"{"type":"Retry","policy":{"retries":5,"delaysInSeconds":[0.5, 1]}}"#,
    );

    let started = Instant::now();
    let response = retry.wrap(backend.service()).oneshot(request()).await.unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(started.elapsed(), Duration::from_millis(500 + 1000 * 3));
}

#[tokio::test(start_paused = true)]
async fn jitter_stays_within_bound() {
    let backend = Scripted::statuses(&[500, 500, 200]);
    let retry = policy(
        "jitter",
        r#"{"type":"Retry","policy":{"retries":2,"delaysInSeconds":[1],"jitterMilliseconds":250}}"#,
    );

    let started = Instant::now();
    retry.wrap(backend.service()).oneshot(request()).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed <= Duration::from_millis(2500));
}

#[tokio::test]
async fn exhausted_retries_return_last_outcome() {
    let backend = Scripted::statuses(&[500]);
    let retry = policy("three", r#"{"type":"Retry","policy":{"retries":2}}"#);

    let response = retry.wrap(backend.service()).oneshot(request()).await.unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(backend.calls(), 3);
}
