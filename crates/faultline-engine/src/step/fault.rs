use super::{ParallelOptions, Step, StepKind};
use crate::error::EntryKind;
use crate::status::{ExecutionStatus, GroupClause};
use crate::EngineError;
use futures::future::BoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// `{ probability, seed? }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorConfig {
    /// Chance of a simulated failure, 0.0 to 1.0.
    pub probability: f64,
    /// Makes the draws reproducible.
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub parallel: ParallelOptions,
}

/// Fails with [`ExecutionStatus::SimulatedFail`] when a uniform draw from
/// `[0, 1)` is at most `probability`.
pub struct ErrorStep {
    name: String,
    probability: f64,
    rng: Mutex<StdRng>,
    parallel: ParallelOptions,
}

impl ErrorStep {
    pub fn new(name: &str, config: ErrorConfig) -> Result<Self, EngineError> {
        if !(0.0..=1.0).contains(&config.probability) {
            return Err(EngineError::invalid(
                EntryKind::Step,
                name,
                format!("probability must be between 0.0 and 1.0, got {}", config.probability),
            ));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            name: name.to_string(),
            probability: config.probability,
            rng: Mutex::new(rng),
            parallel: config.parallel,
        })
    }

    fn draw(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random::<f64>()
    }
}

impl fmt::Debug for ErrorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorStep")
            .field("name", &self.name)
            .field("probability", &self.probability)
            .finish_non_exhaustive()
    }
}

impl Step for ErrorStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Error
    }

    fn parallel_count(&self) -> Option<u32> {
        self.parallel.parallel_count()
    }

    fn fail_on_parallel_failures(&self) -> GroupClause {
        self.parallel.fail_on_parallel_failures()
    }

    fn execute(&self) -> BoxFuture<'_, Result<ExecutionStatus, EngineError>> {
        let draw = self.draw();
        let status = if draw <= self.probability {
            ExecutionStatus::SimulatedFail
        } else {
            ExecutionStatus::Success
        };
        tracing::trace!(step = %self.name, draw, probability = self.probability, %status, "Drew error outcome");
        Box::pin(futures::future::ready(Ok(status)))
    }
}
