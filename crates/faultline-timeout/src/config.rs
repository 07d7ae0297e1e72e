use crate::events::TimeoutEvent;
use faultline_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// What happens to the inner call when the timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutStrategy {
    /// The inner future is dropped, cancelling the call cooperatively.
    #[default]
    Optimistic,
    /// The inner call runs on a detached task and is left to finish on its
    /// own; only the caller stops waiting.
    Pessimistic,
}

/// Configuration for the timeout policy.
pub struct TimeoutConfig {
    pub(crate) timeout: Duration,
    pub(crate) strategy: TimeoutStrategy,
    pub(crate) event_listeners: EventListeners<TimeoutEvent>,
    pub(crate) name: String,
}

impl TimeoutConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeoutConfigBuilder {
        TimeoutConfigBuilder::new()
    }
}

/// Builder for [`TimeoutConfig`].
pub struct TimeoutConfigBuilder {
    timeout: Duration,
    strategy: TimeoutStrategy,
    event_listeners: EventListeners<TimeoutEvent>,
    name: String,
}

impl Default for TimeoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - timeout: 5 seconds
    /// - strategy: optimistic
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            strategy: TimeoutStrategy::Optimistic,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how long a call may run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the timeout strategy.
    pub fn strategy(mut self, strategy: TimeoutStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the name for this timeout instance (used in events and errors).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a call finishes in time, with its
    /// duration.
    pub fn on_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::Completed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call exceeds the timeout.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeoutEvent::TimedOut { timeout, .. } = event {
                f(*timeout);
            }
        }));
        self
    }

    /// Builds the timeout layer.
    pub fn build(self) -> crate::TimeoutLayer {
        crate::TimeoutLayer::new(TimeoutConfig {
            timeout: self.timeout,
            strategy: self.strategy,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
