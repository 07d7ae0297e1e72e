//! Policy layer metrics.

use super::helpers::*;
use faultline_core::{HttpMethod, HttpRequest, HttpResponse, HttpService, PolicyError};
use faultline_policy::{DefaultPolicyFactory, PolicyFactory};
use serial_test::serial;
use tower::ServiceExt;
use tower::util::BoxCloneService;

fn request() -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, url::Url::parse("http://metrics.test/").unwrap())
}

fn failing() -> HttpService {
    BoxCloneService::new(tower::service_fn(|_req: HttpRequest| async {
        Ok::<_, PolicyError>(HttpResponse::new(500))
    }))
}

async fn run(name: &str, setting: &str) {
    let policy = DefaultPolicyFactory::new().create(name, setting).unwrap().unwrap();
    let _ = policy.wrap(failing()).oneshot(request()).await;
}

#[tokio::test]
#[serial]
async fn retry_metrics() {
    init_recorder();
    run("metrics_retry", r#"{"type":"Retry","policy":{"retries":1}}"#).await;

    assert_counter_exists("retry_attempts_total");
    assert_metric_has_label("retry_calls_total", "retry", "metrics_retry");
    assert_metric_has_label("retry_calls_total", "result", "exhausted");
}

#[tokio::test]
#[serial]
async fn circuitbreaker_metrics() {
    init_recorder();
    run(
        "metrics_breaker",
        r#"{"type":"CircuitBreaker","policy":{"breakDuration":1,"faultTolerance":1}}"#,
    )
    .await;

    assert_metric_has_label("circuitbreaker_calls_total", "outcome", "failure");
    assert_metric_has_label("circuitbreaker_transitions_total", "to", "Open");
    assert_gauge_exists("circuitbreaker_state");
}

#[tokio::test]
#[serial]
async fn fallback_metrics() {
    init_recorder();
    run("metrics_fallback", r#"{"type":"Fallback","policy":{"status":200}}"#).await;

    assert_metric_has_label("fallback_calls_total", "fallback", "metrics_fallback");
    assert_metric_has_label("fallback_calls_total", "result", "applied");
}

#[tokio::test]
#[serial]
async fn bulkhead_metrics() {
    init_recorder();
    run("metrics_bulkhead", r#"{"type":"Bulkhead","policy":{"maxParallelization":1}}"#).await;

    assert_metric_has_label("bulkhead_calls_permitted_total", "bulkhead", "metrics_bulkhead");
    assert_gauge_exists("bulkhead_concurrent_calls");
}
