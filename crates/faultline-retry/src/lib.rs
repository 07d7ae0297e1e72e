//! Retry policy for faultline.
//!
//! Retries a call while its outcome is a handled failure (transport error,
//! timeout, open circuit, or a non-2xx response) and retries remain. Waits
//! follow a [`Backoff`] strategy plus optional uniform jitter.
//!
//! # Examples
//!
//! ```
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use faultline_retry::RetryLayer;
//! use tower::ServiceBuilder;
//! use std::time::Duration;
//!
//! let layer = RetryLayer::builder()
//!     .retries(2)
//!     .exponential_backoff(Duration::from_secs(1))
//!     .on_retry(|attempt, delay| {
//!         println!("retry {} after {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(tower::service_fn(|_req: HttpRequest| async {
//!         Ok::<_, PolicyError>(HttpResponse::new(200))
//!     }));
//! ```

mod backoff;
mod config;
mod events;
mod layer;

pub use backoff::Backoff;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use layer::RetryLayer;

use faultline_core::{is_handled_failure, HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

/// A Tower [`Service`] that retries handled failures.
pub struct Retry<S> {
    inner: S,
    config: Arc<RetryConfig>,
}

impl<S> Retry<S> {
    /// Creates a new `Retry` service wrapping the given service.
    pub fn new(inner: S, config: Arc<RetryConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Clone for Retry<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Service<HttpRequest> for Retry<S>
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
        let mut service = self.inner.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let mut attempts = 0usize;

            loop {
                attempts += 1;
                let result = match service.ready().await {
                    Ok(ready) => ready.call(req.clone()).await,
                    Err(err) => Err(err),
                };

                if !is_handled_failure(&result) {
                    config.event_listeners.emit(&RetryEvent::Success {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts,
                    });
                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "success")
                        .increment(1);
                    return result;
                }

                if config.max_retries.is_some_and(|max| attempts > max) {
                    config.event_listeners.emit(&RetryEvent::Exhausted {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        attempts,
                    });
                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => config.name.clone(), "result" => "exhausted")
                        .increment(1);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(retry = %config.name, attempts, "Retries exhausted");
                    return result;
                }

                let delay = config.delay_for(u32::try_from(attempts).unwrap_or(u32::MAX));
                config.event_listeners.emit(&RetryEvent::Retry {
                    policy_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt: attempts,
                    delay,
                });
                #[cfg(feature = "metrics")]
                counter!("retry_attempts_total", "retry" => config.name.clone()).increment(1);
                #[cfg(feature = "tracing")]
                tracing::debug!(retry = %config.name, attempt = attempts, ?delay, "Retrying after handled failure");

                tokio::time::sleep(delay).await;
            }
        })
    }
}
