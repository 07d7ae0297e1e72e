//! Bulkhead compiled from JSON.

use super::test_utils::*;
use faultline_core::PolicyError;
use futures::future::join_all;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test(start_paused = true)]
async fn queue_overflow_is_rejected() {
    let backend = Scripted::statuses(&[200]).with_latency(Duration::from_millis(100));
    let bulkhead = policy(
        "pool",
        r#"{"type":"Bulkhead","policy":{"maxParallelization":2,"maxQueuingActions":1}}"#,
    );
    let svc = bulkhead.wrap(backend.service());

    let results = join_all((0..5).map(|_| svc.clone().oneshot(request()))).await;

    let admitted = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| matches!(result, Err(PolicyError::BulkheadRejected { .. })))
        .count();
    assert_eq!(admitted, 3);
    assert_eq!(rejected, 2);
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn without_queue_extra_calls_fail_fast() {
    let backend = Scripted::statuses(&[200]).with_latency(Duration::from_millis(50));
    let bulkhead = policy("solo", r#"{"type":"Bulkhead","policy":{"maxParallelization":1}}"#);
    let svc = bulkhead.wrap(backend.service());

    let results = join_all((0..3).map(|_| svc.clone().oneshot(request()))).await;
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
}
