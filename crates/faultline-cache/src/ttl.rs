use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// How long a cached response stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Fixed lifetime counted from insertion.
    Relative(Duration),
    /// Lifetime restarted on every hit.
    Sliding(Duration),
    /// Valid until the next time the UTC wall clock reaches `offset` past
    /// midnight.
    Absolute { offset: Duration },
}

impl Ttl {
    /// Lifetime of an entry inserted now.
    pub(crate) fn initial(&self) -> Duration {
        match self {
            Ttl::Relative(ttl) | Ttl::Sliding(ttl) => *ttl,
            Ttl::Absolute { offset } => until_next_daily_offset(*offset, Utc::now()),
        }
    }

    pub(crate) fn is_sliding(&self) -> bool {
        matches!(self, Ttl::Sliding(_))
    }
}

/// Time from `now` until the next instant that is `offset` past a UTC
/// midnight. If today's instant has already passed, tomorrow's is used.
pub fn until_next_daily_offset(offset: Duration, now: DateTime<Utc>) -> Duration {
    // Leap seconds report nanoseconds >= 1e9.
    let nanos = now.nanosecond() % 1_000_000_000;
    let since_midnight =
        Duration::from_secs(u64::from(now.num_seconds_from_midnight())) + Duration::from_nanos(u64::from(nanos));

    if offset > since_midnight {
        offset - since_midnight
    } else {
        DAY + offset - since_midnight
    }
}
