use faultline_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by the timeout policy.
#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    /// The inner call finished (successfully or not) before the timeout.
    Completed {
        policy_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// The timeout fired first.
    TimedOut {
        policy_name: String,
        timestamp: Instant,
        timeout: Duration,
    },
}

impl PolicyEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::Completed { .. } => "Completed",
            TimeoutEvent::TimedOut { .. } => "TimedOut",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::Completed { timestamp, .. } | TimeoutEvent::TimedOut { timestamp, .. } => {
                *timestamp
            }
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            TimeoutEvent::Completed { policy_name, .. }
            | TimeoutEvent::TimedOut { policy_name, .. } => policy_name,
        }
    }
}
