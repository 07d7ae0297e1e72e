use crate::{Retry, RetryConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies the retry policy to a service.
///
/// # Examples
///
/// ```
/// use faultline_retry::RetryLayer;
/// use std::time::Duration;
///
/// let layer = RetryLayer::builder()
///     .retries(3)
///     .delays(vec![Duration::from_millis(100), Duration::from_millis(500)])
///     .jitter(Duration::from_millis(50))
///     .name("orders-retry")
///     .build();
/// ```
#[derive(Clone)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    /// Creates a new `RetryLayer` with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a retry layer.
    pub fn builder() -> crate::RetryConfigBuilder {
        crate::RetryConfigBuilder::new()
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
