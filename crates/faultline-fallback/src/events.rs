//! Events emitted by the fallback service.

use faultline_core::PolicyEvent;
use std::time::Instant;

/// Events emitted by the fallback service.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The inner service produced an outcome that needed no substitution.
    Passed {
        policy_name: String,
        timestamp: Instant,
    },

    /// A handled failure was replaced by the fallback response.
    Applied {
        policy_name: String,
        timestamp: Instant,
        /// Status of the failed response, `None` when the inner call errored.
        failed_status: Option<u16>,
    },
}

impl PolicyEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "passed",
            Self::Applied { .. } => "applied",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Passed { timestamp, .. } | Self::Applied { timestamp, .. } => *timestamp,
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            Self::Passed { policy_name, .. } | Self::Applied { policy_name, .. } => policy_name,
        }
    }
}
