//! Bulkhead service implementation.

use crate::config::BulkheadConfig;
use crate::events::BulkheadEvent;
use faultline_core::{HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Execution slots plus the count of callers waiting for one.
pub(crate) struct Compartment {
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    capacity: usize,
}

/// A claimed place in the wait queue, released on drop.
struct QueueSlot(Arc<AtomicUsize>);

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Compartment {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            queued: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    pub(crate) fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    fn executing(&self) -> usize {
        self.capacity.saturating_sub(self.semaphore.available_permits())
    }

    /// Claims a queue slot unless `max` callers are already waiting.
    fn try_queue(&self, max: usize) -> Option<QueueSlot> {
        self.queued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |q| {
                (q < max).then_some(q + 1)
            })
            .ok()
            .map(|_| QueueSlot(Arc::clone(&self.queued)))
    }

    /// Takes a slot immediately, or waits in the queue for one.
    async fn enter(
        &self,
        config: &BulkheadConfig,
    ) -> Option<OwnedSemaphorePermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(TryAcquireError::Closed) => None,
            Err(TryAcquireError::NoPermits) => {
                let slot = self.try_queue(config.max_queuing_actions)?;
                config.event_listeners.emit(&BulkheadEvent::CallQueued {
                    policy_name: config.name.clone(),
                    timestamp: Instant::now(),
                    queued: self.queued(),
                });

                #[cfg(feature = "metrics")]
                gauge!("bulkhead_queued_calls", "bulkhead" => config.name.clone())
                    .set(self.queued() as f64);

                let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
                drop(slot);
                permit
            }
        }
    }
}

/// Bulkhead service that limits concurrent calls.
#[derive(Clone)]
pub struct Bulkhead<S> {
    inner: S,
    config: Arc<BulkheadConfig>,
    compartment: Arc<Compartment>,
}

impl<S> Bulkhead<S> {
    pub(crate) fn new(inner: S, config: Arc<BulkheadConfig>, compartment: Arc<Compartment>) -> Self {
        Self {
            inner,
            config,
            compartment,
        }
    }
}

impl<S> Service<HttpRequest> for Bulkhead<S>
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

    fn call(&mut self, request: HttpRequest) -> Self::Future {
        let config = Arc::clone(&self.config);
        let compartment = Arc::clone(&self.compartment);
        let inner = self.inner.clone();

        Box::pin(async move {
            let Some(permit) = compartment.enter(&config).await else {
                config.event_listeners.emit(&BulkheadEvent::CallRejected {
                    policy_name: config.name.clone(),
                    timestamp: Instant::now(),
                });

                #[cfg(feature = "metrics")]
                counter!("bulkhead_calls_rejected_total", "bulkhead" => config.name.clone())
                    .increment(1);

                #[cfg(feature = "tracing")]
                tracing::debug!(bulkhead = %config.name, "Call rejected");

                return Err(PolicyError::BulkheadRejected {
                    name: config.name.clone(),
                    max_parallelization: config.max_parallelization,
                    max_queuing_actions: config.max_queuing_actions,
                });
            };

            config.event_listeners.emit(&BulkheadEvent::CallPermitted {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                concurrent_calls: compartment.executing(),
            });

            #[cfg(feature = "metrics")]
            {
                counter!("bulkhead_calls_permitted_total", "bulkhead" => config.name.clone())
                    .increment(1);
                gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone())
                    .set(compartment.executing() as f64);
            }

            let result = inner.oneshot(request).await;
            drop(permit);

            #[cfg(feature = "metrics")]
            gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone())
                .set(compartment.executing() as f64);

            result
        })
    }
}
