use super::AsPolicy;
use crate::PolicyConfigError;
use faultline_core::Policy;
use faultline_timeout::{TimeoutLayer, TimeoutStrategy};
use serde::Deserialize;
use std::time::Duration;

/// Largest timeout accepted, in seconds.
pub const MAX_TIMEOUT_SECONDS: f64 = 922_337_203_685.0;

/// `{ timeoutInSeconds, cancelDelegates }`
///
/// `cancelDelegates` selects the optimistic strategy, which drops the inner
/// call on expiry. Otherwise the call keeps running detached.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeoutConfig {
    pub timeout_in_seconds: f64,
    pub cancel_delegates: bool,
}

impl TimeoutConfig {
    pub fn layer(&self, name: &str) -> Result<TimeoutLayer, PolicyConfigError> {
        let seconds = self.timeout_in_seconds;
        if seconds.is_nan() || !(0.0..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
            return Err(PolicyConfigError::out_of_range(
                name,
                "timeoutInSeconds",
                format!("must be between 0 and {MAX_TIMEOUT_SECONDS}, got {seconds}"),
            ));
        }

        let strategy = if self.cancel_delegates {
            TimeoutStrategy::Optimistic
        } else {
            TimeoutStrategy::Pessimistic
        };

        Ok(TimeoutLayer::builder()
            .timeout(Duration::from_secs_f64(seconds))
            .strategy(strategy)
            .name(name)
            .build())
    }
}

impl AsPolicy for TimeoutConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
