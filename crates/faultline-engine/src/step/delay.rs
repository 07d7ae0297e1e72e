use super::{ParallelOptions, Step, StepKind};
use crate::error::EntryKind;
use crate::status::{ExecutionStatus, GroupClause};
use crate::EngineError;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::time::Duration;

/// `{ time }`: seconds to wait.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayConfig {
    pub time: f64,
    #[serde(flatten)]
    pub parallel: ParallelOptions,
}

/// Waits, then succeeds. The wait does not block the runtime.
#[derive(Debug)]
pub struct DelayStep {
    name: String,
    delay: Duration,
    parallel: ParallelOptions,
}

impl DelayStep {
    pub fn new(name: &str, config: DelayConfig) -> Result<Self, EngineError> {
        let delay = Duration::try_from_secs_f64(config.time).map_err(|_| {
            EngineError::invalid(
                EntryKind::Step,
                name,
                format!("time must be a non-negative number of seconds, got {}", config.time),
            )
        })?;
        Ok(Self {
            name: name.to_string(),
            delay,
            parallel: config.parallel,
        })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Step for DelayStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Delay
    }

    fn parallel_count(&self) -> Option<u32> {
        self.parallel.parallel_count()
    }

    fn fail_on_parallel_failures(&self) -> GroupClause {
        self.parallel.fail_on_parallel_failures()
    }

    fn execute(&self) -> BoxFuture<'_, Result<ExecutionStatus, EngineError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(ExecutionStatus::Success)
        })
    }
}
