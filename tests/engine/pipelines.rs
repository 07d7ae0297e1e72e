//! Processors made of local steps.

use super::{engine, registry};
use faultline_engine::{EngineError, OutcomeStatus, StatusCodes};
use std::time::Duration;
use tokio::time::Instant;

const STEPS: &str = r#"
    "ok": {"type": "DelayStep", "step": {"time": 0.05}},
    "fail": {"type": "ErrorStep", "step": {"probability": 1.0}},
    "never": {"type": "ErrorStep", "step": {"probability": 0.0}},
    "fanout-all": {"type": "Error", "step": {"probability": 0.5, "parallelCount": 16, "failOnParallelFailures": "All"}},
    "fanout-none": {"type": "Error", "step": {"probability": 1.0, "parallelCount": 3, "failOnParallelFailures": "none"}},
    "fanout-any": {"type": "Error", "step": {"probability": 1.0, "parallelCount": 3, "failOnParallelFailures": "Any"}},
    "burn": {"type": "Load", "step": {"timeInSeconds": 0.05, "cpuPercentage": 50, "maxProcessors": 1, "memoryInBytes": 4096}}
"#;

fn document(processors: &str) -> String {
    format!(r#"{{"Steps": {{{STEPS}}}, "Processors": {{{processors}}}, "Policies": {{}}, "Clients": {{}}}}"#)
}

#[tokio::test(start_paused = true)]
async fn success_pays_out_after_ingress_latency() {
    let engine = engine(registry(&document(
        r#""p": {"type": "RequestProcessor", "processor": {
            "steps": ["ok", "never", "ok"], "ingressLatencyMilliseconds": 300,
            "successPayload": {"size": 3000}}}"#,
    )));

    let started = Instant::now();
    let outcome = engine.process_request("p").await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(400));
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.payload.unwrap().len(), 3 * 1024 + 1);
}

#[tokio::test]
async fn simulated_fault_carries_error_payload() {
    let engine = engine(registry(&document(
        r#""p": {"type": "Request", "processor": {
            "steps": ["never", "fail", "ok"],
            "successPayload": {"size": 10}, "errorPayload": {"size": 1}}}"#,
    )));

    let outcome = engine.process_request("p").await.unwrap();
    assert_eq!(outcome.status, OutcomeStatus::SimulatedFault);
    assert_eq!(outcome.payload.unwrap().len(), 1025);
    assert_eq!(engine.status_code(&engine.process_request("p").await.unwrap()), 418);
}

#[tokio::test]
async fn parallel_group_clauses() {
    let engine = engine(registry(&document(
        r#""all": {"type": "Request", "processor": {"steps": ["fanout-all"]}},
           "none": {"type": "Request", "processor": {"steps": ["fanout-none", "ok"]}},
           "any": {"type": "Request", "processor": {"steps": ["fanout-any", "ok"]}}"#,
    )));

    // 16 coin flips with a fixed seed: at least one succeeds.
    assert!(engine.process_request("all").await.unwrap().is_success());
    assert!(engine.process_request("none").await.unwrap().is_success());
    assert_eq!(
        engine.process_request("any").await.unwrap().status,
        OutcomeStatus::SimulatedFault
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_step_completes() {
    let engine = engine(registry(&document(
        r#""p": {"type": "Request", "processor": {"steps": ["burn"]}}"#,
    )));
    assert!(engine.process_request("p").await.unwrap().is_success());
}

#[tokio::test]
async fn custom_status_codes() {
    let engine = engine(registry(&document(
        r#""p": {"type": "Request", "processor": {"steps": ["fail"]}}"#,
    )))
    .with_status_codes(StatusCodes {
        simulated_fault: 503,
        ..StatusCodes::default()
    });

    let outcome = engine.process_request("p").await.unwrap();
    assert_eq!(engine.status_code(&outcome), 503);
}

#[tokio::test]
async fn malformed_step_surfaces_on_use() {
    let document = r#"{
        "Steps": {"broken": {"type": "Delay", "step": {"time": "later"}}},
        "Processors": {"p": {"type": "Request", "processor": {"steps": ["broken"]}}},
        "Policies": {}, "Clients": {}
    }"#;
    let engine = engine(registry(document));

    match engine.process_request("p").await {
        Err(EngineError::NotFound { name, .. }) => assert_eq!(name, "broken"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn startup_runs_synchronous_processors_in_order() {
    let engine = engine(registry(&document(
        r#""boot": {"type": "Startup", "processor": {"steps": ["ok"]}},
           "bg": {"type": "Startup", "processor": {"steps": ["fail"], "asynchronous": true}},
           "then": {"type": "Startup", "processor": {"steps": ["never"]}},
           "req": {"type": "Request", "processor": {"steps": ["fail"]}}"#,
    )));

    engine.process_startup_actions().await.unwrap();
    assert!(matches!(
        engine.process_request("boot").await,
        Err(EngineError::NotRequestProcessor(_))
    ));
}
