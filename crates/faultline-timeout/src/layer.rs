use crate::{Timeout, TimeoutConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that bounds how long calls may take.
///
/// # Examples
///
/// ```
/// use faultline_timeout::{TimeoutLayer, TimeoutStrategy};
/// use std::time::Duration;
///
/// let layer = TimeoutLayer::builder()
///     .timeout(Duration::from_secs(2))
///     .strategy(TimeoutStrategy::Pessimistic)
///     .name("slow-backend")
///     .build();
/// ```
#[derive(Clone)]
pub struct TimeoutLayer {
    config: Arc<TimeoutConfig>,
}

impl TimeoutLayer {
    /// Creates a new `TimeoutLayer` with the given configuration.
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a timeout layer.
    pub fn builder() -> crate::TimeoutConfigBuilder {
        crate::TimeoutConfigBuilder::new()
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, service: S) -> Self::Service {
        Timeout::new(service, Arc::clone(&self.config))
    }
}
