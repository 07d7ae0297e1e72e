//! Runs processors.

use crate::processor::Processor;
use crate::registry::Registry;
use crate::status::{aggregate, ExecutionStatus};
use crate::step::Step;
use crate::EngineError;
use bytes::Bytes;
use futures::future::join_all;
#[cfg(feature = "metrics")]
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a processor run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    Success,
    /// A step reported a scripted failure.
    SimulatedFault,
    /// A step failed for real.
    UnexpectedFault,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::SimulatedFault => "simulated_fault",
            OutcomeStatus::UnexpectedFault => "unexpected_fault",
        }
    }
}

impl From<ExecutionStatus> for OutcomeStatus {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Success => OutcomeStatus::Success,
            ExecutionStatus::SimulatedFail => OutcomeStatus::SimulatedFault,
            ExecutionStatus::Fail => OutcomeStatus::UnexpectedFault,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire status codes for each [`OutcomeStatus`].
///
/// ```json
/// { "success": 200, "simulatedFault": 418, "unexpectedFault": 500 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusCodes {
    pub success: u16,
    pub simulated_fault: u16,
    pub unexpected_fault: u16,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            success: 200,
            simulated_fault: 418,
            unexpected_fault: 500,
        }
    }
}

impl StatusCodes {
    pub fn code(&self, status: OutcomeStatus) -> u16 {
        match status {
            OutcomeStatus::Success => self.success,
            OutcomeStatus::SimulatedFault => self.simulated_fault,
            OutcomeStatus::UnexpectedFault => self.unexpected_fault,
        }
    }
}

/// Result of [`Engine::process_request`]: the status and the processor's
/// success or error payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOutcome {
    pub status: OutcomeStatus,
    pub payload: Option<Bytes>,
}

impl ProcessorOutcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Executes processors from a [`Registry`].
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    status_codes: StatusCodes,
}

impl Engine {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            status_codes: StatusCodes::default(),
        }
    }

    pub fn with_status_codes(mut self, status_codes: StatusCodes) -> Self {
        self.status_codes = status_codes;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Wire code for `outcome`.
    pub fn status_code(&self, outcome: &ProcessorOutcome) -> u16 {
        self.status_codes.code(outcome.status)
    }

    /// Runs the request processor `name`.
    ///
    /// Lookup and configuration errors are returned as errors; step
    /// failures become a non-success [`ProcessorOutcome`].
    pub async fn process_request(&self, name: &str) -> Result<ProcessorOutcome, EngineError> {
        crate::error::ensure_not_blank(name, "processor name")?;
        let processor = self.registry.get_processor(name, true)?;

        let status = OutcomeStatus::from(self.run(&processor).await?);
        let payload = match status {
            OutcomeStatus::Success => processor.success_payload(),
            OutcomeStatus::SimulatedFault | OutcomeStatus::UnexpectedFault => processor.error_payload(),
        };
        Ok(ProcessorOutcome {
            status,
            payload: payload.cloned(),
        })
    }

    /// Runs every startup processor.
    ///
    /// Asynchronous processors are spawned and their failures only logged.
    /// Synchronous ones run in registration order; the first that does not
    /// succeed stops startup.
    pub async fn process_startup_actions(&self) -> Result<(), EngineError> {
        for processor in self.registry.startup_processors() {
            if processor.is_asynchronous() {
                let engine = self.clone();
                tokio::spawn(async move {
                    match engine.run(&processor).await {
                        Ok(ExecutionStatus::Success) => {}
                        Ok(status) => tracing::warn!(
                            processor = %processor.name(),
                            status = %status,
                            "Background startup processor did not succeed"
                        ),
                        Err(err) => tracing::error!(
                            processor = %processor.name(),
                            error = %err,
                            "Background startup processor failed"
                        ),
                    }
                });
                continue;
            }

            let status = self.run(&processor).await?;
            if !status.is_success() {
                return Err(EngineError::StartupFailed {
                    processor: processor.name().to_string(),
                    status,
                });
            }
        }
        Ok(())
    }

    /// Runs `step` once, or as a parallel group reduced by its group clause.
    pub async fn execute_step(&self, step: &dyn Step) -> Result<ExecutionStatus, EngineError> {
        #[cfg(feature = "metrics")]
        counter!("step_executions_total", "step" => step.name().to_string()).increment(1);

        match step.parallel_count() {
            Some(count) if count >= 2 => {
                let statuses = join_all((0..count).map(|_| step.execute()))
                    .await
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()?;
                let status = aggregate(&statuses, step.fail_on_parallel_failures());
                tracing::debug!(
                    step = %step.name(),
                    count,
                    clause = ?step.fail_on_parallel_failures(),
                    status = %status,
                    "Parallel group finished"
                );
                Ok(status)
            }
            _ => step.execute().await,
        }
    }

    async fn run(&self, processor: &Processor) -> Result<ExecutionStatus, EngineError> {
        if !processor.ingress_latency().is_zero() {
            tokio::time::sleep(processor.ingress_latency()).await;
        }

        for name in processor.steps() {
            let step = self.registry.get_step(name)?;
            let status = self.execute_step(step.as_ref()).await?;

            match status {
                ExecutionStatus::Success => continue,
                ExecutionStatus::SimulatedFail => {
                    tracing::info!(processor = %processor.name(), step = %name, "Simulated fault");
                }
                ExecutionStatus::Fail => {
                    tracing::error!(processor = %processor.name(), step = %name, "Unexpected fault");
                }
            }
            record(processor, status);
            return Ok(status);
        }

        record(processor, ExecutionStatus::Success);
        Ok(ExecutionStatus::Success)
    }
}

#[cfg(feature = "metrics")]
fn record(processor: &Processor, status: ExecutionStatus) {
    counter!(
        "processor_runs_total",
        "processor" => processor.name().to_string(),
        "outcome" => OutcomeStatus::from(status).as_str()
    )
    .increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record(_processor: &Processor, _status: ExecutionStatus) {}
