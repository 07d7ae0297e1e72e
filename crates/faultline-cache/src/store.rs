//! Cache storage implementation.

use faultline_core::HttpResponse;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Debug)]
struct CacheEntry {
    response: HttpResponse,
    ttl: Duration,
    /// `None` when the deadline does not fit in an `Instant`.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(response: HttpResponse, ttl: Duration, now: Instant) -> Self {
        Self {
            response,
            ttl,
            expires_at: now.checked_add(ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Bounded LRU store of responses with per-entry expiry.
pub(crate) struct CacheStore {
    entries: LruCache<String, CacheEntry>,
}

impl CacheStore {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Returns a live entry, restarting its lifetime when `sliding`.
    pub(crate) fn get(&mut self, key: &str, sliding: bool) -> Option<HttpResponse> {
        let now = Instant::now();
        let entry = self.entries.get_mut(key)?;

        if entry.is_expired(now) {
            self.entries.pop(key);
            return None;
        }
        if sliding {
            entry.expires_at = now.checked_add(entry.ttl);
        }
        Some(entry.response.clone())
    }

    pub(crate) fn insert(&mut self, key: String, response: HttpResponse, ttl: Duration) {
        self.entries
            .put(key, CacheEntry::new(response, ttl, Instant::now()));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
