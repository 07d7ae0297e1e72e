//! Binding request steps to client factories.

use super::registry;
use faultline_engine::{EngineError, EntryKind};
use std::sync::Arc;

const DOCUMENT: &str = r#"{
    "Steps": {
        "owned": {"type": "Request", "step": {"clientName": "api", "path": "/", "method": "GET"}},
        "pooled": {"type": "Request", "step": {"clientName": "api", "path": "/", "method": "GET", "reuseHttpMessageHandler": true}},
        "idle": {"type": "Delay", "step": {"time": 0}}
    },
    "Processors": {},
    "Policies": {
        "retry": {"type": "retry", "policy": {"retries": 1}},
        "guard": {"type": "CircuitBreakerConfig", "policy": {"breakDuration": 1, "faultTolerance": 3}}
    },
    "Clients": {
        "api": {"baseAddress": "http://localhost:8080/", "policies": ["retry", "guard"]}
    }
}"#;

#[test]
fn binds_owned_and_pooled_steps() {
    let registry = registry(DOCUMENT);
    let pooled = Arc::new(registry.pooled_client_factory().unwrap());
    registry.configure_http_clients(pooled).unwrap();

    for name in ["owned", "pooled"] {
        let step = registry.get_step(name).unwrap();
        let request = step.as_request_step().unwrap();
        assert!(request.is_configured(), "{name}");
    }
    assert!(registry.get_step("idle").unwrap().as_request_step().is_none());
}

#[test]
fn second_configure_fails() {
    let registry = registry(DOCUMENT);
    let pooled = Arc::new(registry.pooled_client_factory().unwrap());
    registry.configure_http_clients(pooled.clone()).unwrap();

    assert!(matches!(
        registry.configure_http_clients(pooled),
        Err(EngineError::AlreadyConfigured(_))
    ));

    let step = registry.get_step("pooled").unwrap();
    let request = step.as_request_step().unwrap();
    let factory = Arc::new(registry.pooled_client_factory().unwrap());
    assert!(matches!(
        request.configure_owned(factory, None),
        Err(EngineError::ReuseModeMismatch { reuse: true, .. })
    ));
}

#[test]
fn null_policy_list_fails_for_owned_steps() {
    let registry = registry(
        r#"{
            "Steps": {"owned": {"type": "Request", "step": {"clientName": "api", "path": "/", "method": "GET"}}},
            "Processors": {}, "Policies": {},
            "Clients": {"api": {"baseAddress": "http://localhost:8080/", "policies": null}}
        }"#,
    );
    let pooled = Arc::new(faultline_engine::ReqwestClientFactory::pooled().unwrap());

    assert!(matches!(
        registry.configure_http_clients(pooled),
        Err(EngineError::MissingClientPolicies(client)) if client == "api"
    ));
}

#[test]
fn null_policy_entry_fails() {
    let registry = registry(
        r#"{
            "Steps": {"owned": {"type": "Request", "step": {"clientName": "api", "path": "/", "method": "GET"}}},
            "Processors": {}, "Policies": {},
            "Clients": {"api": {"baseAddress": "http://localhost:8080/", "policies": [null]}}
        }"#,
    );
    let pooled = Arc::new(faultline_engine::ReqwestClientFactory::pooled().unwrap());

    assert!(matches!(
        registry.configure_http_clients(pooled),
        Err(EngineError::InvalidConfig { kind: EntryKind::Client, .. })
    ));
}

#[test]
fn unknown_client_fails() {
    let registry = registry(
        r#"{
            "Steps": {"owned": {"type": "Request", "step": {"clientName": "ghost", "path": "/", "method": "GET"}}},
            "Processors": {}, "Policies": {}, "Clients": {}
        }"#,
    );
    let pooled = Arc::new(faultline_engine::ReqwestClientFactory::pooled().unwrap());

    assert!(matches!(
        registry.configure_http_clients(pooled),
        Err(EngineError::NotFound { kind: EntryKind::Client, .. })
    ));
}

#[test]
fn unknown_policy_type_aborts_loading() {
    let source = faultline_engine::JsonConfigurationSource::parse(
        r#"{"Steps": {}, "Processors": {}, "Clients": {},
            "Policies": {"odd": {"type": "RateLimiter", "policy": {}}}}"#,
    )
    .unwrap();

    assert!(matches!(
        faultline_engine::Registry::new(&source, &faultline_engine::Factories::default()),
        Err(EngineError::Policy(faultline_policy::PolicyConfigError::UnknownType { .. }))
    ));
}
