//! Configuration for the fallback policy.

use crate::FallbackEvent;
use bytes::Bytes;
use faultline_core::{EventListeners, FnListener, HttpResponse};

/// Configuration for the fallback policy.
pub struct FallbackConfig {
    pub(crate) name: String,
    pub(crate) response: HttpResponse,
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
}

impl FallbackConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> FallbackConfigBuilder {
        FallbackConfigBuilder::new()
    }

    /// The response substituted for handled failures.
    pub fn response(&self) -> &HttpResponse {
        &self.response
    }
}

/// Builder for constructing a [`FallbackLayer`](crate::FallbackLayer).
pub struct FallbackConfigBuilder {
    name: String,
    response: HttpResponse,
    event_listeners: EventListeners<FallbackEvent>,
}

impl Default for FallbackConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackConfigBuilder {
    /// Creates a new builder substituting an empty `200` response.
    pub fn new() -> Self {
        Self {
            name: "fallback".to_string(),
            response: HttpResponse::new(200),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this fallback instance (used in metrics and events).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Status code of the substituted response.
    pub fn status(mut self, status: u16) -> Self {
        self.response.status = status;
        self
    }

    /// Reason phrase of the substituted response.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.response.reason = Some(reason.into());
        self
    }

    /// Body of the substituted response, sent as UTF-8 JSON.
    pub fn content(mut self, content: impl Into<Bytes>) -> Self {
        self.response.body = content.into();
        self
    }

    /// Registers a callback invoked with the failed status (or `None` for an
    /// error) each time the fallback response is substituted.
    pub fn on_applied<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<u16>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Applied { failed_status, .. } = event {
                f(*failed_status);
            }
        }));
        self
    }

    /// Adds an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FallbackEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Builds the fallback layer.
    pub fn build(self) -> crate::FallbackLayer {
        crate::FallbackLayer::new(FallbackConfig {
            name: self.name,
            response: self.response,
            event_listeners: self.event_listeners,
        })
    }
}
