//! Response cache policy for faultline.
//!
//! Calls carrying a cache key in their [`ExecutionContext`] are served from
//! the store when a live entry exists. Only responses with status 200 are
//! stored. Calls without a key pass straight through.
//!
//! Expiry follows [`Ttl`]:
//! - relative: fixed lifetime from insertion
//! - sliding: lifetime restarted on each hit
//! - absolute: the next daily UTC wall-clock time at a fixed offset from midnight
//!
//! ```rust
//! use faultline_cache::{CacheLayer, Ttl};
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use tower::{Layer, service_fn};
//! use std::time::Duration;
//!
//! let layer = CacheLayer::builder()
//!     .ttl(Ttl::Absolute { offset: Duration::from_secs(3 * 3600) })
//!     .build();
//!
//! let svc = layer.layer(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(200))
//! }));
//! ```
//!
//! [`ExecutionContext`]: faultline_core::ExecutionContext

mod config;
mod events;
mod layer;
mod store;
mod ttl;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use events::CacheEvent;
pub use layer::CacheLayer;
pub use ttl::{until_next_daily_offset, Ttl};

use faultline_core::{HttpRequest, HttpResponse, PolicyError};
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;
use store::CacheStore;
use tower::{Service, ServiceExt};

/// Status code eligible for caching.
const CACHEABLE_STATUS: u16 = 200;

fn lock(store: &Mutex<CacheStore>) -> MutexGuard<'_, CacheStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A Tower service that caches 200 responses by execution-context key.
pub struct Cache<S> {
    inner: S,
    config: Arc<CacheConfig>,
    store: Arc<Mutex<CacheStore>>,
}

impl<S> Cache<S> {
    pub(crate) fn new(inner: S, config: Arc<CacheConfig>, store: Arc<Mutex<CacheStore>>) -> Self {
        Self {
            inner,
            config,
            store,
        }
    }
}

impl<S: Clone> Clone for Cache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> Service<HttpRequest> for Cache<S>
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
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let Some(key) = req.context.cache_key().map(str::to_owned) else {
                return inner.oneshot(req).await;
            };

            let cached = lock(&store).get(&key, config.ttl.is_sliding());
            if let Some(response) = cached {
                #[cfg(feature = "metrics")]
                counter!("cache_hits_total", "cache" => config.name.clone()).increment(1);
                #[cfg(feature = "tracing")]
                tracing::debug!(cache = %config.name, key = %key, "Cache hit");

                config.event_listeners.emit(&CacheEvent::Hit {
                    policy_name: config.name.clone(),
                    timestamp: Instant::now(),
                    key,
                });
                return Ok(response);
            }

            #[cfg(feature = "metrics")]
            counter!("cache_misses_total", "cache" => config.name.clone()).increment(1);
            config.event_listeners.emit(&CacheEvent::Miss {
                policy_name: config.name.clone(),
                timestamp: Instant::now(),
                key: key.clone(),
            });

            let result = inner.oneshot(req).await;

            if let Ok(response) = &result {
                let ttl = config.ttl.initial();
                if response.status == CACHEABLE_STATUS && !ttl.is_zero() {
                    let mut guard = lock(&store);
                    guard.insert(key.clone(), response.clone(), ttl);

                    #[cfg(feature = "metrics")]
                    gauge!("cache_size", "cache" => config.name.clone()).set(guard.len() as f64);
                    drop(guard);

                    config.event_listeners.emit(&CacheEvent::Stored {
                        policy_name: config.name.clone(),
                        timestamp: Instant::now(),
                        key,
                        ttl,
                    });
                }
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{ExecutionContext, HttpMethod, HttpService};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::service_fn;
    use tower::util::BoxCloneService;
    use tower::Layer;
    use url::Url;

    fn keyed(key: &str) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, Url::parse("http://localhost/data").unwrap())
            .with_context(ExecutionContext::new().with_cache_key(key))
    }

    fn counting(status: u16, calls: Arc<AtomicUsize>) -> HttpService {
        BoxCloneService::new(service_fn(move |_req: HttpRequest| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok::<_, PolicyError>(HttpResponse::new(status).with_body(format!("call-{n}")))
            }
        }))
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = CacheLayer::builder()
            .build()
            .layer(counting(200, Arc::clone(&calls)));

        let first = svc.clone().oneshot(keyed("users")).await.unwrap();
        let second = svc.clone().oneshot(keyed("users")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn only_200_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = CacheLayer::builder()
            .build()
            .layer(counting(201, Arc::clone(&calls)));

        svc.clone().oneshot(keyed("k")).await.unwrap();
        svc.clone().oneshot(keyed("k")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn requests_without_key_bypass_the_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let layer = CacheLayer::builder().build();
        let svc = layer.layer(counting(200, Arc::clone(&calls)));
        let request =
            || HttpRequest::new(HttpMethod::Get, Url::parse("http://localhost/data").unwrap());

        svc.clone().oneshot(request()).await.unwrap();
        svc.clone().oneshot(request()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(layer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn relative_entries_expire() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let svc = CacheLayer::builder()
            .ttl(Ttl::Relative(Duration::from_secs(10)))
            .on_hit(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .layer(counting(200, Arc::clone(&calls)));

        svc.clone().oneshot(keyed("k")).await.unwrap();
        tokio::time::advance(Duration::from_secs(9)).await;
        svc.clone().oneshot(keyed("k")).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        svc.clone().oneshot(keyed("k")).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
