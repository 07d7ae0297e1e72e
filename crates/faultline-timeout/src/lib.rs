//! Timeout policy for faultline.
//!
//! Two strategies are available:
//! - [`TimeoutStrategy::Optimistic`] races the inner call against a timer and
//!   drops it when the timer wins.
//! - [`TimeoutStrategy::Pessimistic`] runs the inner call on a detached task;
//!   when the timer wins the caller gets [`PolicyError::Timeout`] while the
//!   abandoned call keeps running to completion in the background.
//!
//! ```rust
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use faultline_timeout::TimeoutLayer;
//! use tower::{Layer, service_fn};
//! use std::time::Duration;
//!
//! let layer = TimeoutLayer::builder()
//!     .timeout(Duration::from_millis(250))
//!     .on_timeout(|after| eprintln!("gave up after {:?}", after))
//!     .build();
//!
//! let svc = layer.layer(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(200))
//! }));
//! ```

use faultline_core::{HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

pub use config::{TimeoutConfig, TimeoutConfigBuilder, TimeoutStrategy};
pub use events::TimeoutEvent;
pub use layer::TimeoutLayer;

mod config;
mod events;
mod layer;

/// A Tower service that bounds the duration of an inner service's calls.
#[derive(Clone)]
pub struct Timeout<S> {
    inner: S,
    config: Arc<TimeoutConfig>,
}

impl<S> Timeout<S> {
    pub(crate) fn new(inner: S, config: Arc<TimeoutConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Service<HttpRequest> for Timeout<S>
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

        Box::pin(async move {
            let start = tokio::time::Instant::now();
            let call = inner.oneshot(req);

            let outcome = match config.strategy {
                TimeoutStrategy::Optimistic => tokio::time::timeout(config.timeout, call).await,
                TimeoutStrategy::Pessimistic => {
                    let handle = tokio::spawn(call);
                    match tokio::time::timeout(config.timeout, handle).await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(join_err)) => Ok(Err(PolicyError::transport(join_err))),
                        Err(elapsed) => Err(elapsed),
                    }
                }
            };

            match outcome {
                Ok(result) => {
                    let duration = start.elapsed();
                    config.event_listeners.emit(&TimeoutEvent::Completed {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        duration,
                    });

                    #[cfg(feature = "metrics")]
                    {
                        counter!("timeout_calls_total", "timeout" => config.name.clone(), "result" => "completed").increment(1);
                        histogram!("timeout_call_duration_seconds", "timeout" => config.name.clone())
                            .record(duration.as_secs_f64());
                    }

                    #[cfg(feature = "tracing")]
                    debug!(
                        timeout = %config.name,
                        duration_ms = duration.as_millis(),
                        "Call completed within timeout"
                    );

                    result
                }
                Err(_elapsed) => {
                    config.event_listeners.emit(&TimeoutEvent::TimedOut {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        timeout: config.timeout,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("timeout_calls_total", "timeout" => config.name.clone(), "result" => "timeout").increment(1);

                    #[cfg(feature = "tracing")]
                    warn!(
                        timeout = %config.name,
                        timeout_ms = config.timeout.as_millis(),
                        strategy = ?config.strategy,
                        "Call timed out"
                    );

                    Err(PolicyError::timeout(config.name.clone(), config.timeout))
                }
            }
        })
    }
}
