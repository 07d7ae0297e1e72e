use crate::circuit::CircuitState;
use faultline_core::events::PolicyEvent;
use std::time::Instant;

/// Events emitted by the circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    StateTransition {
        policy_name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    CallRejected {
        policy_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    SuccessRecorded {
        policy_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    FailureRecorded {
        policy_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl PolicyEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "StateTransition",
            CircuitBreakerEvent::CallRejected { .. } => "CallRejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "SuccessRecorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "FailureRecorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { policy_name, .. }
            | CircuitBreakerEvent::CallRejected { policy_name, .. }
            | CircuitBreakerEvent::SuccessRecorded { policy_name, .. }
            | CircuitBreakerEvent::FailureRecorded { policy_name, .. } => policy_name,
        }
    }
}
