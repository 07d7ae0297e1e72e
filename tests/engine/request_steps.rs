//! Request steps against a live mock server.

use super::{engine, registry};
use faultline_engine::{EngineError, OutcomeStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn document(base: &str, steps: &str, policies: &str, client_policies: &str) -> String {
    format!(
        r#"{{
            "Steps": {{{steps}}},
            "Processors": {{"p": {{"type": "Request", "processor": {{"steps": ["call"]}}}}}},
            "Policies": {{{policies}}},
            "Clients": {{"backend": {{
                "baseAddress": "{base}",
                "requestHeaders": {{"x-scenario": "chaos", "x-blank": null}},
                "policies": {client_policies}
            }}}}
        }}"#
    )
}

#[tokio::test]
async fn sends_configured_headers_and_maps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("x-scenario", "chaos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "orders", "method": "get"}},
           "lost": {"type": "Request", "step": {"clientName": "backend", "path": "/missing", "method": "GET"}}"#,
        "",
        "[]",
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();
    let engine = engine(registry);

    assert!(engine.process_request("p").await.unwrap().is_success());

    let lost = engine.registry().get_step("lost").unwrap();
    assert_eq!(
        engine.execute_step(lost.as_ref()).await.unwrap(),
        faultline_engine::ExecutionStatus::Fail
    );
}

#[tokio::test]
async fn posts_synthesized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/upload", "method": "POST", "payloadSize": 2048}}"#,
        "",
        "[]",
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    assert!(engine(registry).process_request("p").await.unwrap().is_success());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(requests[0].body.len(), 2 * 1024 + 1);
}

#[tokio::test]
async fn owned_retry_recovers_from_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/", "method": "GET"}}"#,
        r#""retry": {"type": "Retry", "policy": {"retries": 3, "delaysInSeconds": [0.01]}}"#,
        r#"["retry"]"#,
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    assert!(engine(registry).process_request("p").await.unwrap().is_success());
}

#[tokio::test]
async fn timeout_becomes_unexpected_fault() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/slow", "method": "GET"}}"#,
        r#""quick": {"type": "Timeout", "policy": {"timeoutInSeconds": 0.05, "cancelDelegates": true}}"#,
        r#"["quick"]"#,
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    let outcome = engine(registry).process_request("p").await.unwrap();
    assert_eq!(outcome.status, OutcomeStatus::UnexpectedFault);
}

#[tokio::test]
async fn fallback_turns_outage_into_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/items/1", "method": "Delete"}}"#,
        r#""fallback": {"type": "Fallback", "policy": {"status": 200, "content": "{}"}}"#,
        r#"["fallback"]"#,
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    assert!(engine(registry).process_request("p").await.unwrap().is_success());
}

#[tokio::test]
async fn asynchronous_request_reports_success_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let registry = registry(&document(
        &server.uri(),
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/", "method": "GET", "asynchronous": true}}"#,
        "",
        "[]",
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    assert!(engine(registry).process_request("p").await.unwrap().is_success());
}

#[tokio::test]
async fn unreachable_host_is_a_failure_not_an_error() {
    let registry = registry(&document(
        "http://127.0.0.1:9",
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "/", "method": "GET"}}"#,
        "",
        "[]",
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    let outcome = engine(registry).process_request("p").await.unwrap();
    assert_eq!(outcome.status, OutcomeStatus::UnexpectedFault);
}

#[tokio::test]
async fn absolute_path_is_rejected_on_execute() {
    let registry = registry(&document(
        "http://127.0.0.1:9",
        r#""call": {"type": "Request", "step": {"clientName": "backend", "path": "file:///etc/passwd", "method": "GET"}}"#,
        "",
        "[]",
    ));
    registry
        .configure_http_clients(Arc::new(registry.pooled_client_factory().unwrap()))
        .unwrap();

    assert!(matches!(
        engine(registry).process_request("p").await,
        Err(EngineError::InvalidConfig { .. })
    ));
}
