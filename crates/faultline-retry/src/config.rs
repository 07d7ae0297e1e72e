use crate::backoff::{Backoff, Jitter};
use crate::events::RetryEvent;
use faultline_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the retry policy.
pub struct RetryConfig {
    pub(crate) max_retries: Option<usize>,
    pub(crate) backoff: Backoff,
    pub(crate) jitter: Jitter,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl RetryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Full wait before retry number `retry` (1-based), jitter included.
    pub(crate) fn delay_for(&self, retry: u32) -> Duration {
        self.backoff
            .delay_for(retry)
            .saturating_add(self.jitter.sample())
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    max_retries: Option<usize>,
    backoff: Backoff,
    jitter: Duration,
    seed: Option<u64>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - retries: 3
    /// - backoff: immediate
    /// - jitter: none
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_retries: Some(3),
            backoff: Backoff::Immediate,
            jitter: Duration::ZERO,
            seed: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how many retries follow the first attempt.
    pub fn retries(mut self, retries: usize) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Retries handled failures until the call succeeds.
    pub fn retry_forever(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Sets the backoff strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Waits `base * 2^n` before the n-th retry.
    pub fn exponential_backoff(self, base: Duration) -> Self {
        self.backoff(Backoff::Exponential { base })
    }

    /// Uses `delays` per retry, reusing the last one. An empty list retries
    /// immediately.
    pub fn delays(self, delays: Vec<Duration>) -> Self {
        if delays.is_empty() {
            self.backoff(Backoff::Immediate)
        } else {
            self.backoff(Backoff::Schedule(delays))
        }
    }

    /// Adds a uniform random delay in `[0, max]` to every wait.
    pub fn jitter(mut self, max: Duration) -> Self {
        self.jitter = max;
        self
    }

    /// Seeds the jitter generator for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the name for this retry instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each retry with the retry number
    /// (1-based) and the wait that precedes it.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked with the total attempt count when a call
    /// ends in an outcome that is not a handled failure.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked with the total attempt count when
    /// retries run out.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the retry layer.
    pub fn build(self) -> crate::RetryLayer {
        let config = RetryConfig {
            max_retries: self.max_retries,
            backoff: self.backoff,
            jitter: Jitter::new(self.jitter, self.seed),
            event_listeners: self.event_listeners,
            name: self.name,
        };

        crate::RetryLayer::new(config)
    }
}
