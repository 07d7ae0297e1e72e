//! Typed policy configuration models.
//!
//! Every model deserializes leniently (camelCase, unknown fields ignored,
//! missing fields defaulted) and validates its ranges only when compiled.

mod bulkhead;
mod cache;
mod circuit_breaker;
mod fallback;
mod retry;
mod timeout;

pub use bulkhead::BulkheadConfig;
pub use cache::{CacheConfig, CacheTime};
pub use circuit_breaker::{AdvancedCircuitBreakerConfig, CircuitBreakerConfig};
pub use fallback::FallbackConfig;
pub use retry::RetryConfig;
pub use timeout::TimeoutConfig;

use crate::PolicyConfigError;
use faultline_core::Policy;
use std::time::Duration;

/// A configuration model that validates itself and compiles into a
/// [`Policy`].
pub trait AsPolicy {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError>;
}

/// Smallest break and sampling duration the circuit breakers accept.
pub(crate) const MIN_BREAK_SECONDS: f64 = 0.02;

/// Converts a seconds value, requiring it to be finite and at least `min`.
pub(crate) fn seconds_at_least(
    policy: &str,
    field: &'static str,
    value: f64,
    min: f64,
) -> Result<Duration, PolicyConfigError> {
    if value.is_nan() || value < min {
        return Err(PolicyConfigError::out_of_range(
            policy,
            field,
            format!("must be at least {min} seconds, got {value}"),
        ));
    }
    Duration::try_from_secs_f64(value).map_err(|_| {
        PolicyConfigError::out_of_range(policy, field, format!("{value} seconds is not a valid duration"))
    })
}
