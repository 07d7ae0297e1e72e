use super::{seconds_at_least, AsPolicy};
use crate::PolicyConfigError;
use faultline_core::Policy;
use faultline_retry::{RetryConfigBuilder, RetryLayer};
use serde::Deserialize;
use std::time::Duration;

/// Marker delay list selecting exponential backoff.
const EXPONENTIAL_MARKER: f64 = -1.0;

/// `{ retries, delaysInSeconds, jitterMilliseconds, seed? }`
///
/// - `retries < 1` retries forever
/// - empty `delaysInSeconds` retries immediately
/// - `[-1]` waits `2^n` seconds before the n-th retry
/// - otherwise the n-th delay is used for the n-th retry, the last one reused
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub retries: i32,
    pub delays_in_seconds: Vec<f64>,
    pub jitter_milliseconds: i64,
    /// Seeds the jitter generator; unset draws from the OS.
    pub seed: Option<u64>,
}

impl RetryConfig {
    /// Validates the model and builds the concrete layer.
    pub fn layer(&self, name: &str) -> Result<RetryLayer, PolicyConfigError> {
        let mut builder = RetryConfigBuilder::new().name(name);

        builder = if self.retries < 1 {
            builder.retry_forever()
        } else {
            builder.retries(self.retries as usize)
        };

        builder = match self.delays_in_seconds.as_slice() {
            [only] if *only == EXPONENTIAL_MARKER => {
                builder.exponential_backoff(Duration::from_secs(1))
            }
            delays => builder.delays(
                delays
                    .iter()
                    .map(|&delay| seconds_at_least(name, "delaysInSeconds", delay, 0.0))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        let jitter = u64::try_from(self.jitter_milliseconds).map_err(|_| {
            PolicyConfigError::out_of_range(
                name,
                "jitterMilliseconds",
                format!("must not be negative, got {}", self.jitter_milliseconds),
            )
        })?;
        builder = builder.jitter(Duration::from_millis(jitter));

        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        Ok(builder.build())
    }
}

impl AsPolicy for RetryConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
