mod pipelines;
mod request_steps;
mod wiring;

use faultline::engine::{Factories, JsonConfigurationSource};
use faultline::{Engine, Registry};
use std::sync::Arc;

/// Routes engine logs to the test output; `RUST_LOG=faultline_engine=debug`
/// shows step wiring and request traffic.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Loads `document` with seeded factories.
pub fn registry(document: &str) -> Registry {
    init_tracing();
    let source = JsonConfigurationSource::parse(document).unwrap();
    Registry::new(&source, &Factories::with_seed(42)).unwrap()
}

pub fn engine(registry: Registry) -> Engine {
    Engine::new(Arc::new(registry))
}
