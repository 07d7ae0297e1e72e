use crate::events::CacheEvent;
use crate::ttl::Ttl;
use faultline_core::events::{EventListeners, FnListener};
use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for the cache policy.
pub struct CacheConfig {
    pub(crate) ttl: Ttl,
    pub(crate) max_entries: NonZeroUsize,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

impl CacheConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    ttl: Ttl,
    max_entries: NonZeroUsize,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - ttl: 5 minutes, relative
    /// - max entries: 1024
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            ttl: Ttl::Relative(Duration::from_secs(300)),
            max_entries: DEFAULT_CAPACITY,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the expiry strategy.
    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bounds the number of cached responses; the least recently used entry
    /// is evicted first. Zero is raised to one.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = NonZeroUsize::new(max).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Sets the name for this cache instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for cache hits, with the key.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Hit { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback for cache misses, with the key.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Miss { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Builds the cache layer.
    pub fn build(self) -> crate::CacheLayer {
        crate::CacheLayer::new(CacheConfig {
            ttl: self.ttl,
            max_entries: self.max_entries,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
