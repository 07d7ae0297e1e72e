use crate::config::CacheConfig;
use crate::store::CacheStore;
use crate::Cache;
use std::sync::{Arc, Mutex, PoisonError};
use tower::Layer;

/// A Tower [`Layer`] that caches successful responses.
///
/// The store belongs to the layer, so all services it wraps read and write
/// the same entries.
///
/// # Examples
///
/// ```
/// use faultline_cache::{CacheLayer, Ttl};
/// use std::time::Duration;
///
/// let layer = CacheLayer::builder()
///     .ttl(Ttl::Sliding(Duration::from_secs(30)))
///     .max_entries(500)
///     .build();
/// assert_eq!(layer.len(), 0);
/// ```
#[derive(Clone)]
pub struct CacheLayer {
    config: Arc<CacheConfig>,
    store: Arc<Mutex<CacheStore>>,
}

impl CacheLayer {
    /// Creates a new `CacheLayer` with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let store = CacheStore::new(config.max_entries);
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Creates a new builder for configuring a cache layer.
    pub fn builder() -> crate::CacheConfigBuilder {
        crate::CacheConfigBuilder::new()
    }

    /// Number of stored entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = Cache<S>;

    fn layer(&self, service: S) -> Self::Service {
        Cache::new(service, Arc::clone(&self.config), Arc::clone(&self.store))
    }
}
