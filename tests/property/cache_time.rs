//! Property tests for cache time spans.
//!
//! Invariants tested:
//! - Any negative component yields zero
//! - Sums that overflow yield zero
//! - Otherwise the span is the exact sum of its components

use faultline_policy::model::CacheTime;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn exact_sum_for_valid_components(
        days in 0i64..10_000,
        hours in 0i64..1_000,
        minutes in 0i64..1_000,
        seconds in 0i64..100_000,
    ) {
        let time = CacheTime { days, hours, minutes, seconds };
        let expected = days as u64 * 86_400 + hours as u64 * 3_600 + minutes as u64 * 60 + seconds as u64;
        prop_assert_eq!(time.as_duration(), Duration::from_secs(expected));
    }

    #[test]
    fn negative_component_is_zero(
        components in prop::array::uniform4(-1_000i64..1_000),
        negative in 0usize..4,
        magnitude in 1i64..1_000,
    ) {
        let mut components = components;
        components[negative] = -magnitude;
        let [days, hours, minutes, seconds] = components;
        let time = CacheTime { days, hours, minutes, seconds };
        prop_assert_eq!(time.as_duration(), Duration::ZERO);
    }

    #[test]
    fn overflow_is_zero(days in (u64::MAX / 86_400 + 1) as i64..i64::MAX, seconds in 0i64..100) {
        let time = CacheTime { days, hours: 0, minutes: 0, seconds };
        prop_assert_eq!(time.as_duration(), Duration::ZERO);
    }
}

#[test]
fn maximum_sum_does_not_overflow() {
    let time = CacheTime { days: 0, hours: 0, minutes: 0, seconds: i64::MAX };
    assert_eq!(time.as_duration(), Duration::from_secs(i64::MAX as u64));
}
