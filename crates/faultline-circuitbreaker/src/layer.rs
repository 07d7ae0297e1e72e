use crate::circuit::{Circuit, CircuitState};
use crate::{CircuitBreaker, CircuitBreakerConfig};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tower::Layer;

/// A Tower [`Layer`] that applies a circuit breaker.
///
/// The circuit lives in the layer: every service produced by [`Layer::layer`]
/// reports to and is gated by the same breaker.
///
/// # Examples
///
/// ```
/// use faultline_circuitbreaker::CircuitBreakerLayer;
/// use std::time::Duration;
///
/// let layer = CircuitBreakerLayer::builder()
///     .failure_rate(0.5, Duration::from_secs(10), 8)
///     .break_duration(Duration::from_secs(30))
///     .name("inventory")
///     .build();
/// assert!(!layer.is_open());
/// ```
#[derive(Clone)]
pub struct CircuitBreakerLayer {
    config: Arc<CircuitBreakerConfig>,
    circuit: Arc<Mutex<Circuit>>,
    state: Arc<AtomicU8>,
}

impl CircuitBreakerLayer {
    /// Creates a new layer with the given configuration.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let state = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            config: Arc::new(config),
            circuit: Arc::new(Mutex::new(Circuit::new(Arc::clone(&state)))),
            state,
        }
    }

    /// Creates a new builder for configuring a circuit breaker layer.
    pub fn builder() -> crate::CircuitBreakerConfigBuilder {
        crate::CircuitBreakerConfigBuilder::new()
    }

    /// Current state without taking the circuit lock.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true while calls are being rejected outright.
    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreaker<S>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreaker::new(service, Arc::clone(&self.config), Arc::clone(&self.circuit))
    }
}
