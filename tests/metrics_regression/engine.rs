//! Engine metrics.

use super::helpers::*;
use faultline_engine::{Engine, Factories, JsonConfigurationSource, Registry};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn processor_and_step_metrics() {
    init_recorder();

    let source = JsonConfigurationSource::parse(
        r#"{
            "Steps": {"metrics_fail": {"type": "Error", "step": {"probability": 1}}},
            "Processors": {"metrics_processor": {"type": "Request", "processor": {"steps": ["metrics_fail"]}}},
            "Policies": {}, "Clients": {}
        }"#,
    )
    .unwrap();
    let engine = Engine::new(Arc::new(Registry::new(&source, &Factories::default()).unwrap()));
    engine.process_request("metrics_processor").await.unwrap();

    assert_metric_has_label("step_executions_total", "step", "metrics_fail");
    assert_metric_has_label("processor_runs_total", "processor", "metrics_processor");
    assert_metric_has_label("processor_runs_total", "outcome", "simulated_fault");
}
