use faultline_core::events::PolicyEvent;
use std::time::Instant;

/// Events emitted by the bulkhead.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A call obtained an execution slot.
    CallPermitted {
        policy_name: String,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    /// A call had to wait for a slot.
    CallQueued {
        policy_name: String,
        timestamp: Instant,
        queued: usize,
    },
    /// Neither an execution slot nor a queue slot was free.
    CallRejected {
        policy_name: String,
        timestamp: Instant,
    },
}

impl PolicyEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "CallPermitted",
            BulkheadEvent::CallQueued { .. } => "CallQueued",
            BulkheadEvent::CallRejected { .. } => "CallRejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallQueued { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. } => *timestamp,
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { policy_name, .. }
            | BulkheadEvent::CallQueued { policy_name, .. }
            | BulkheadEvent::CallRejected { policy_name, .. } => policy_name,
        }
    }
}
