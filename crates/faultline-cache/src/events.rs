use faultline_core::events::PolicyEvent;
use std::time::{Duration, Instant};

/// Events emitted by the cache policy.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit {
        policy_name: String,
        timestamp: Instant,
        key: String,
    },
    Miss {
        policy_name: String,
        timestamp: Instant,
        key: String,
    },
    /// A 200 response was stored under `key` for `ttl`.
    Stored {
        policy_name: String,
        timestamp: Instant,
        key: String,
        ttl: Duration,
    },
}

impl PolicyEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "Hit",
            CacheEvent::Miss { .. } => "Miss",
            CacheEvent::Stored { .. } => "Stored",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Stored { timestamp, .. } => *timestamp,
        }
    }

    fn policy_name(&self) -> &str {
        match self {
            CacheEvent::Hit { policy_name, .. }
            | CacheEvent::Miss { policy_name, .. }
            | CacheEvent::Stored { policy_name, .. } => policy_name,
        }
    }
}
