use super::{ParallelOptions, Step, StepKind};
use crate::error::EntryKind;
use crate::status::{ExecutionStatus, GroupClause};
use crate::EngineError;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Length of one duty cycle.
const SLICE: Duration = Duration::from_millis(100);

/// `{ timeInSeconds, cpuPercentage, maxProcessors, memoryInBytes }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadConfig {
    /// Negative runs until the process exits.
    pub time_in_seconds: f64,
    pub cpu_percentage: f64,
    /// Zero uses every available core.
    pub max_processors: i64,
    pub memory_in_bytes: i64,
    #[serde(flatten)]
    pub parallel: ParallelOptions,
}

/// Holds memory and keeps cores busy for a while, then succeeds.
///
/// Memory is allocated and written before the CPU phase and released after
/// it. Each core runs a blocking loop that spins for `cpuPercentage` of
/// every 100 ms slice and sleeps for the rest.
#[derive(Debug)]
pub struct LoadStep {
    name: String,
    /// `None` runs forever.
    duration: Option<Duration>,
    busy_fraction: f64,
    workers: usize,
    memory_in_bytes: usize,
    parallel: ParallelOptions,
}

impl LoadStep {
    pub fn new(name: &str, config: LoadConfig) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::invalid(EntryKind::Step, name, reason);

        let duration = if config.time_in_seconds < 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(config.time_in_seconds).map_err(|_| {
                invalid(format!("timeInSeconds {} is not a duration", config.time_in_seconds))
            })?)
        };
        if !(0.0..=100.0).contains(&config.cpu_percentage) {
            return Err(invalid(format!(
                "cpuPercentage must be between 0 and 100, got {}",
                config.cpu_percentage
            )));
        }
        let max_processors = usize::try_from(config.max_processors).map_err(|_| {
            invalid(format!("maxProcessors must not be negative, got {}", config.max_processors))
        })?;
        let memory_in_bytes = usize::try_from(config.memory_in_bytes).map_err(|_| {
            invalid(format!(
                "memoryInBytes must be between 0 and {}, got {}",
                usize::MAX,
                config.memory_in_bytes
            ))
        })?;

        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        let workers = match max_processors {
            0 => available,
            max => max.min(available),
        };

        Ok(Self {
            name: name.to_string(),
            duration,
            busy_fraction: config.cpu_percentage / 100.0,
            workers,
            memory_in_bytes,
            parallel: config.parallel,
        })
    }

    /// Cores kept busy.
    pub fn workers(&self) -> usize {
        self.workers
    }

    fn allocate(&self) -> Result<Vec<u8>, std::collections::TryReserveError> {
        let mut memory = Vec::new();
        memory.try_reserve_exact(self.memory_in_bytes)?;
        memory.resize(self.memory_in_bytes, 0xA5);
        Ok(memory)
    }

    async fn run(&self) -> ExecutionStatus {
        let memory = match self.allocate() {
            Ok(memory) => memory,
            Err(err) => {
                tracing::error!(step = %self.name, bytes = self.memory_in_bytes, error = %err, "Memory allocation failed");
                return ExecutionStatus::Fail;
            }
        };

        if self.busy_fraction == 0.0 {
            match self.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
            drop(memory);
            return ExecutionStatus::Success;
        }

        // An overflowing deadline is as good as none.
        let deadline = self
            .duration
            .and_then(|duration| Instant::now().checked_add(duration));
        let busy_fraction = self.busy_fraction;

        let workers = (0..self.workers)
            .map(|_| tokio::task::spawn_blocking(move || burn(busy_fraction, deadline)));
        let results = futures::future::join_all(workers).await;
        drop(memory);

        match results.into_iter().find_map(Result::err) {
            Some(err) => {
                tracing::error!(step = %self.name, error = %err, "Load worker failed");
                ExecutionStatus::Fail
            }
            None => ExecutionStatus::Success,
        }
    }
}

/// Spins for `busy_fraction` of each slice until `deadline`, or forever.
fn burn(busy_fraction: f64, deadline: Option<Instant>) {
    let busy = SLICE.mul_f64(busy_fraction);
    let idle = SLICE.saturating_sub(busy);
    loop {
        let slice_start = Instant::now();
        let remaining = match deadline {
            Some(deadline) => match deadline.checked_duration_since(slice_start) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return,
            },
            None => SLICE,
        };

        let spin_for = busy.min(remaining);
        while slice_start.elapsed() < spin_for {
            std::hint::spin_loop();
        }
        let rest = idle.min(remaining.saturating_sub(spin_for));
        if !rest.is_zero() {
            std::thread::sleep(rest);
        }
    }
}

impl Step for LoadStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Load
    }

    fn parallel_count(&self) -> Option<u32> {
        self.parallel.parallel_count()
    }

    fn fail_on_parallel_failures(&self) -> GroupClause {
        self.parallel.fail_on_parallel_failures()
    }

    fn execute(&self) -> BoxFuture<'_, Result<ExecutionStatus, EngineError>> {
        Box::pin(async move { Ok(self.run().await) })
    }
}
