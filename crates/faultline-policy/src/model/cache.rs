use super::AsPolicy;
use crate::PolicyConfigError;
use faultline_cache::{CacheLayer, Ttl};
use faultline_core::Policy;
use serde::Deserialize;
use std::time::Duration;

/// A day/hour/minute/second span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CacheTime {
    /// The span as a [`Duration`]. Zero when any component is negative or
    /// the sum does not fit.
    pub fn as_duration(&self) -> Duration {
        let component = |value: i64, unit: u64| u64::try_from(value).ok()?.checked_mul(unit);
        let total = component(self.days, 86_400)
            .zip(component(self.hours, 3_600))
            .zip(component(self.minutes, 60))
            .zip(component(self.seconds, 1))
            .and_then(|(((d, h), m), s)| d.checked_add(h)?.checked_add(m)?.checked_add(s));
        total.map(Duration::from_secs).unwrap_or(Duration::ZERO)
    }
}

/// `{ time, absolute, sliding }`
///
/// With `absolute`, `time` is an offset from UTC midnight and entries expire
/// at its next occurrence. Otherwise `time` is a lifetime, restarted on each
/// hit when `sliding`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub time: CacheTime,
    pub absolute: bool,
    pub sliding: bool,
}

impl CacheConfig {
    pub fn ttl(&self, name: &str) -> Result<Ttl, PolicyConfigError> {
        let span = self.time.as_duration();
        if span.is_zero() {
            return Err(PolicyConfigError::out_of_range(
                name,
                "time",
                "must be a positive span with no negative component",
            ));
        }
        Ok(if self.absolute {
            Ttl::Absolute { offset: span }
        } else if self.sliding {
            Ttl::Sliding(span)
        } else {
            Ttl::Relative(span)
        })
    }

    pub fn layer(&self, name: &str) -> Result<CacheLayer, PolicyConfigError> {
        Ok(CacheLayer::builder().ttl(self.ttl(name)?).name(name).build())
    }
}

impl AsPolicy for CacheConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
