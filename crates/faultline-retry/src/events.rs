use faultline_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry policy.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A handled failure is about to be retried after `delay`.
    Retry {
        policy_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The call produced an outcome that is not a handled failure.
    Success {
        policy_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Retries ran out; the last handled failure is returned.
    Exhausted {
        policy_name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl PolicyEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::Exhausted { .. } => "Exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. } => *timestamp,
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            RetryEvent::Retry { policy_name, .. }
            | RetryEvent::Success { policy_name, .. }
            | RetryEvent::Exhausted { policy_name, .. } => policy_name,
        }
    }
}
