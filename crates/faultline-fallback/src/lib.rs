//! Fallback policy for faultline.
//!
//! When the inner service produces a handled failure (a transport error,
//! timeout, open circuit, or a non-2xx response) the fallback substitutes
//! a synthetic response built from a status, an optional reason phrase and
//! a JSON body. Bulkhead rejections and cancellations propagate unchanged.
//!
//! ```rust
//! use faultline_fallback::FallbackLayer;
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use tower::{Layer, service_fn};
//!
//! let layer = FallbackLayer::builder()
//!     .status(200)
//!     .content("{}")
//!     .name("catalog-fallback")
//!     .build();
//!
//! let svc = layer.layer(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(503))
//! }));
//! ```

mod config;
mod events;
mod layer;

pub use config::{FallbackConfig, FallbackConfigBuilder};
pub use events::FallbackEvent;
pub use layer::FallbackLayer;

use faultline_core::{is_handled_failure, HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::Service;

/// A Tower service that substitutes a fixed response for handled failures.
pub struct Fallback<S> {
    inner: S,
    config: Arc<FallbackConfig>,
}

impl<S> Fallback<S> {
    pub(crate) fn new(inner: S, config: Arc<FallbackConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S: Clone> Clone for Fallback<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Service<HttpRequest> for Fallback<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = PolicyError> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = PolicyError;
    type Future = BoxFuture<'static, Result<HttpResponse, PolicyError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let config = Arc::clone(&self.config);
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;

            if !is_handled_failure(&result) {
                #[cfg(feature = "metrics")]
                counter!(
                    "fallback_calls_total",
                    "fallback" => config.name.clone(),
                    "result" => "passed"
                )
                .increment(1);

                config.event_listeners.emit(&FallbackEvent::Passed {
                    policy_name: config.name.clone(),
                    timestamp: Instant::now(),
                });
                return result;
            }

            let failed_status = result.as_ref().ok().map(|response| response.status);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                fallback = %config.name,
                failed_status = ?failed_status,
                "Substituting fallback response"
            );

            #[cfg(feature = "metrics")]
            counter!(
                "fallback_calls_total",
                "fallback" => config.name.clone(),
                "result" => "applied"
            )
            .increment(1);

            config.event_listeners.emit(&FallbackEvent::Applied {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                failed_status,
            });

            Ok(config.response.clone())
        })
    }
}
