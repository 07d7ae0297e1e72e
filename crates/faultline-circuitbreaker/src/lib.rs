//! Circuit breaker policy for faultline.
//!
//! A closed circuit lets calls through and watches their outcomes. Once the
//! configured [`TripCondition`] is met the circuit opens and every call fails
//! fast with [`PolicyError::CircuitOpen`]. After the break duration the next
//! caller becomes the single half-open trial: success closes the circuit,
//! a handled failure opens it again, and concurrent callers are rejected
//! while the trial is in flight.
//!
//! Two trip conditions are supported:
//! - consecutive handled failures (`faultTolerance`)
//! - failure rate over a rolling sampling window with a minimum throughput
//!
//! ```rust
//! use faultline_circuitbreaker::CircuitBreakerLayer;
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use tower::{service_fn, Layer};
//! use std::time::Duration;
//!
//! let layer = CircuitBreakerLayer::builder()
//!     .consecutive_failures(3)
//!     .break_duration(Duration::from_secs(5))
//!     .on_state_transition(|from, to| println!("{:?} -> {:?}", from, to))
//!     .build();
//!
//! let svc = layer.layer(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(200))
//! }));
//! ```

mod circuit;
mod config;
mod events;
mod layer;

pub use circuit::CircuitState;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, TripCondition};
pub use events::CircuitBreakerEvent;
pub use layer::CircuitBreakerLayer;

use circuit::{Circuit, Permit};
use faultline_core::{is_handled_failure, HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

fn lock(circuit: &Mutex<Circuit>) -> MutexGuard<'_, Circuit> {
    circuit.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A Tower service gated by a circuit breaker.
pub struct CircuitBreaker<S> {
    inner: S,
    config: Arc<CircuitBreakerConfig>,
    circuit: Arc<Mutex<Circuit>>,
}

impl<S> CircuitBreaker<S> {
    pub(crate) fn new(
        inner: S,
        config: Arc<CircuitBreakerConfig>,
        circuit: Arc<Mutex<Circuit>>,
    ) -> Self {
        Self {
            inner,
            config,
            circuit,
        }
    }

    /// Current circuit state.
    pub fn state(&self) -> CircuitState {
        lock(&self.circuit).state()
    }
}

impl<S: Clone> Clone for CircuitBreaker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            circuit: Arc::clone(&self.circuit),
        }
    }
}

/// Holds an admission until its outcome is recorded. Dropping an unrecorded
/// trial frees the half-open slot.
struct Admission {
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<CircuitBreakerConfig>,
    permit: Permit,
    recorded: bool,
}

impl Admission {
    fn record(mut self, failed: bool) {
        self.recorded = true;
        lock(&self.circuit).record(self.permit, failed, &self.config);
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if !self.recorded && self.permit == Permit::Trial {
            lock(&self.circuit).release_trial();
        }
    }
}

impl<S> Service<HttpRequest> for CircuitBreaker<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = PolicyError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = PolicyError;
    type Future = BoxFuture<'static, Result<HttpResponse, PolicyError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let inner = self.inner.clone();
        let config = Arc::clone(&self.config);
        let circuit = Arc::clone(&self.circuit);

        Box::pin(async move {
            let (permit, state) = {
                let mut guard = lock(&circuit);
                let permit = guard.try_acquire(&config);
                (permit, guard.state())
            };

            let Some(permit) = permit else {
                config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallRejected {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        state,
                    });

                #[cfg(feature = "metrics")]
                counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected")
                    .increment(1);

                #[cfg(feature = "tracing")]
                tracing::debug!(circuitbreaker = %config.name, ?state, "Call rejected");

                return Err(PolicyError::circuit_open(config.name.clone()));
            };

            let admission = Admission {
                circuit,
                config,
                permit,
                recorded: false,
            };

            let result = inner.oneshot(req).await;
            admission.record(is_handled_failure(&result));
            result
        })
    }
}
