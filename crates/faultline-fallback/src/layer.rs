use crate::{Fallback, FallbackConfig};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that replaces handled failures with a fixed response.
///
/// # Examples
///
/// ```
/// use faultline_fallback::FallbackLayer;
///
/// let layer = FallbackLayer::builder()
///     .status(203)
///     .reason("served from fallback")
///     .content(r#"{"degraded":true}"#)
///     .build();
/// ```
#[derive(Clone)]
pub struct FallbackLayer {
    config: Arc<FallbackConfig>,
}

impl FallbackLayer {
    /// Creates a new `FallbackLayer` with the given configuration.
    pub fn new(config: FallbackConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a fallback layer.
    pub fn builder() -> crate::FallbackConfigBuilder {
        crate::FallbackConfigBuilder::new()
    }
}

impl<S> Layer<S> for FallbackLayer {
    type Service = Fallback<S>;

    fn layer(&self, service: S) -> Self::Service {
        Fallback::new(service, Arc::clone(&self.config))
    }
}
