//! Bulkhead layer implementation.

use crate::config::BulkheadConfig;
use crate::service::{Bulkhead, Compartment};
use std::sync::Arc;
use tower::Layer;

/// Layer that applies a bulkhead to a service.
///
/// Slots and queue are owned by the layer, so every service it wraps draws
/// from the same compartment.
#[derive(Clone)]
pub struct BulkheadLayer {
    config: Arc<BulkheadConfig>,
    compartment: Arc<Compartment>,
}

impl BulkheadLayer {
    pub(crate) fn new(config: BulkheadConfig) -> Self {
        let compartment = Arc::new(Compartment::new(config.max_parallelization));
        Self {
            config: Arc::new(config),
            compartment,
        }
    }

    /// Creates a new builder for configuring a bulkhead layer.
    pub fn builder() -> crate::BulkheadConfigBuilder {
        crate::BulkheadConfigBuilder::new()
    }

    /// Number of free execution slots.
    pub fn available_slots(&self) -> usize {
        self.compartment.available_slots()
    }

    /// Number of callers currently waiting for a slot.
    pub fn queued(&self) -> usize {
        self.compartment.queued()
    }
}

impl<S> Layer<S> for BulkheadLayer {
    type Service = Bulkhead<S>;

    fn layer(&self, service: S) -> Self::Service {
        Bulkhead::new(service, Arc::clone(&self.config), Arc::clone(&self.compartment))
    }
}
