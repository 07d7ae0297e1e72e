use crate::events::BulkheadEvent;
use crate::layer::BulkheadLayer;
use faultline_core::events::{EventListeners, FnListener};

/// Configuration for the bulkhead policy.
pub struct BulkheadConfig {
    pub(crate) max_parallelization: usize,
    pub(crate) max_queuing_actions: usize,
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
    pub(crate) name: String,
}

impl BulkheadConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }
}

/// Builder for configuring a bulkhead.
pub struct BulkheadConfigBuilder {
    max_parallelization: usize,
    max_queuing_actions: usize,
    event_listeners: EventListeners<BulkheadEvent>,
    name: String,
}

impl BulkheadConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_parallelization: 25,
            max_queuing_actions: 0,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Maximum number of calls executing at once. Values below 1 are raised
    /// to 1.
    pub fn max_parallelization(mut self, max: usize) -> Self {
        self.max_parallelization = max.max(1);
        self
    }

    /// Maximum number of callers waiting for a slot. Zero rejects as soon as
    /// every slot is busy.
    pub fn max_queuing_actions(mut self, max: usize) -> Self {
        self.max_queuing_actions = max;
        self
    }

    /// Sets the name of this bulkhead instance.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a call is admitted, with the number of calls
    /// executing including this one.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallPermitted {
                concurrent_calls, ..
            } = event
            {
                f(*concurrent_calls);
            }
        }));
        self
    }

    /// Registers a callback when a call is rejected.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, BulkheadEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the bulkhead layer.
    pub fn build(self) -> BulkheadLayer {
        BulkheadLayer::new(BulkheadConfig {
            max_parallelization: self.max_parallelization,
            max_queuing_actions: self.max_queuing_actions,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
