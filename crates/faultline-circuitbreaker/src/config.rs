use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use faultline_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// When a closed circuit opens.
#[derive(Debug, Clone, PartialEq)]
pub enum TripCondition {
    /// Open after `fault_tolerance` handled failures in a row.
    ConsecutiveFailures { fault_tolerance: usize },
    /// Open when, over the last `sampling_duration`, at least
    /// `minimum_throughput` calls were seen and the share of handled failures
    /// reached `failure_threshold` (0.0 to 1.0).
    FailureRate {
        failure_threshold: f64,
        sampling_duration: Duration,
        minimum_throughput: usize,
    },
}

/// Configuration for the circuit breaker policy.
pub struct CircuitBreakerConfig {
    pub(crate) trip: TripCondition,
    pub(crate) break_duration: Duration,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    trip: TripCondition,
    break_duration: Duration,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - trip condition: 5 consecutive failures
    /// - break duration: 30 seconds
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            trip: TripCondition::ConsecutiveFailures { fault_tolerance: 5 },
            break_duration: Duration::from_secs(30),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Opens after `fault_tolerance` consecutive handled failures.
    pub fn consecutive_failures(mut self, fault_tolerance: usize) -> Self {
        self.trip = TripCondition::ConsecutiveFailures {
            fault_tolerance: fault_tolerance.max(1),
        };
        self
    }

    /// Opens on the failure rate observed within a rolling window.
    pub fn failure_rate(
        mut self,
        failure_threshold: f64,
        sampling_duration: Duration,
        minimum_throughput: usize,
    ) -> Self {
        self.trip = TripCondition::FailureRate {
            failure_threshold: failure_threshold.clamp(0.0, 1.0),
            sampling_duration,
            minimum_throughput,
        };
        self
    }

    /// How long the circuit stays open before admitting a trial call.
    pub fn break_duration(mut self, duration: Duration) -> Self {
        self.break_duration = duration;
        self
    }

    /// Sets the name for this circuit breaker (used in events and errors).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for state transitions.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback for calls rejected without reaching the inner
    /// service.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback for every handled failure the breaker records.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Builds the circuit breaker layer.
    pub fn build(self) -> crate::CircuitBreakerLayer {
        crate::CircuitBreakerLayer::new(CircuitBreakerConfig {
            trip: self.trip,
            break_duration: self.break_duration,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
