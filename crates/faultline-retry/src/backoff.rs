use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// How long to wait before each retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    /// Retry without waiting.
    Immediate,
    /// Wait `base * 2^n` before the n-th retry.
    Exponential { base: Duration },
    /// Wait the n-th listed delay before the n-th retry; the last entry is
    /// reused once the list runs out.
    Schedule(Vec<Duration>),
}

impl Backoff {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self {
            Backoff::Immediate => Duration::ZERO,
            Backoff::Exponential { base } => 2u32
                .checked_pow(retry)
                .and_then(|factor| base.checked_mul(factor))
                .unwrap_or(Duration::MAX),
            Backoff::Schedule(delays) => {
                let index = (retry.max(1) as usize - 1).min(delays.len().saturating_sub(1));
                delays.get(index).copied().unwrap_or(Duration::ZERO)
            }
        }
    }
}

/// Uniform random extra delay in `[0, max]`, at millisecond resolution.
pub(crate) struct Jitter {
    max_millis: u64,
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub(crate) fn new(max: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            max_millis: u64::try_from(max.as_millis()).unwrap_or(u64::MAX),
            rng: Mutex::new(rng),
        }
    }

    pub(crate) fn sample(&self) -> Duration {
        if self.max_millis == 0 {
            return Duration::ZERO;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.random_range(0..=self.max_millis))
    }
}
