//! Shared helpers for policy stack tests.

use faultline_core::{
    ExecutionContext, HttpMethod, HttpRequest, HttpResponse, HttpResult, HttpService, Policy,
    PolicyError,
};
use faultline_policy::{DefaultPolicyFactory, PolicyFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::BoxCloneService;
use url::Url;

pub fn request() -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, Url::parse("http://backend.test/orders").unwrap())
}

pub fn keyed_request(key: &str) -> HttpRequest {
    request().with_context(ExecutionContext::new().with_cache_key(key))
}

/// Compiles one JSON policy setting, seeded for reproducible jitter.
pub fn policy(name: &str, setting: &str) -> Policy {
    DefaultPolicyFactory::with_seed(7)
        .create(name, setting)
        .unwrap()
        .expect("setting is well-formed")
}

/// A service that replays `script` and then repeats its last entry.
#[derive(Clone)]
pub struct Scripted {
    script: Arc<Mutex<Vec<HttpResult>>>,
    calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl Scripted {
    pub fn new(script: Vec<HttpResult>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(AtomicUsize::new(0)),
            latency: Duration::ZERO,
        }
    }

    pub fn statuses(statuses: &[u16]) -> Self {
        Self::new(statuses.iter().map(|&status| Ok(HttpResponse::new(status))).collect())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn service(&self) -> HttpService {
        let this = self.clone();
        BoxCloneService::new(tower::service_fn(move |_req: HttpRequest| {
            let this = this.clone();
            async move {
                this.calls.fetch_add(1, Ordering::SeqCst);
                if !this.latency.is_zero() {
                    tokio::time::sleep(this.latency).await;
                }
                let mut script = this.script.lock().unwrap();
                if script.len() > 1 {
                    script.pop().unwrap()
                } else {
                    script
                        .last()
                        .cloned()
                        .unwrap_or_else(|| Err(PolicyError::transport("empty script")))
                }
            }
        }))
    }
}
