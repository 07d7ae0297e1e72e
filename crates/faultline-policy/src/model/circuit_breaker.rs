use super::{seconds_at_least, AsPolicy, MIN_BREAK_SECONDS};
use crate::PolicyConfigError;
use faultline_circuitbreaker::CircuitBreakerLayer;
use faultline_core::Policy;
use serde::Deserialize;

/// `{ breakDuration, faultTolerance }`: opens after `faultTolerance`
/// consecutive handled failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircuitBreakerConfig {
    /// Seconds.
    pub break_duration: f64,
    pub fault_tolerance: i32,
}

impl CircuitBreakerConfig {
    pub fn layer(&self, name: &str) -> Result<CircuitBreakerLayer, PolicyConfigError> {
        let break_duration =
            seconds_at_least(name, "breakDuration", self.break_duration, MIN_BREAK_SECONDS)?;
        if self.fault_tolerance < 1 {
            return Err(PolicyConfigError::out_of_range(
                name,
                "faultTolerance",
                format!("must be at least 1, got {}", self.fault_tolerance),
            ));
        }

        Ok(CircuitBreakerLayer::builder()
            .consecutive_failures(self.fault_tolerance as usize)
            .break_duration(break_duration)
            .name(name)
            .build())
    }
}

impl AsPolicy for CircuitBreakerConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}

/// `{ breakDuration, failureThreshold, samplingDuration, minimumThroughput }`:
/// opens on the failure ratio seen in a rolling window.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedCircuitBreakerConfig {
    /// Seconds.
    pub break_duration: f64,
    pub failure_threshold: f64,
    /// Seconds.
    pub sampling_duration: f64,
    pub minimum_throughput: i32,
}

impl AdvancedCircuitBreakerConfig {
    pub fn layer(&self, name: &str) -> Result<CircuitBreakerLayer, PolicyConfigError> {
        let break_duration =
            seconds_at_least(name, "breakDuration", self.break_duration, MIN_BREAK_SECONDS)?;
        let sampling_duration = seconds_at_least(
            name,
            "samplingDuration",
            self.sampling_duration,
            MIN_BREAK_SECONDS,
        )?;
        if !(0.0..=1.0).contains(&self.failure_threshold) {
            return Err(PolicyConfigError::out_of_range(
                name,
                "failureThreshold",
                format!("must be between 0.0 and 1.0, got {}", self.failure_threshold),
            ));
        }
        let minimum_throughput = usize::try_from(self.minimum_throughput).map_err(|_| {
            PolicyConfigError::out_of_range(
                name,
                "minimumThroughput",
                format!("must not be negative, got {}", self.minimum_throughput),
            )
        })?;

        Ok(CircuitBreakerLayer::builder()
            .failure_rate(self.failure_threshold, sampling_duration, minimum_throughput)
            .break_duration(break_duration)
            .name(name)
            .build())
    }
}

impl AsPolicy for AdvancedCircuitBreakerConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
