//! Units of simulated work.
//!
//! Step settings use the envelope `{ "type": <kind>, "step": { ... } }`,
//! where the kind is `Delay`, `Load`, `Error` or `Request` (a trailing
//! `Step` is accepted, case is ignored). Every step body may also carry
//! `parallelCount` and `failOnParallelFailures`.

mod delay;
mod fault;
mod load;
mod request;

pub use delay::{DelayConfig, DelayStep};
pub use fault::{ErrorConfig, ErrorStep};
pub use load::{LoadConfig, LoadStep};
pub use request::{CacheUniqueness, RequestConfig, RequestStep};

use crate::envelope::{self, EnvelopeError};
use crate::error::{ensure_not_blank, EntryKind};
use crate::status::{ExecutionStatus, GroupClause};
use crate::EngineError;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Which step implementation a setting names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Delay,
    Load,
    Error,
    Request,
}

impl StepKind {
    const ALL: [StepKind; 4] = [StepKind::Delay, StepKind::Load, StepKind::Error, StepKind::Request];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Delay => "Delay",
            StepKind::Load => "Load",
            StepKind::Error => "Error",
            StepKind::Request => "Request",
        }
    }

    pub fn resolve(discriminator: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| envelope::names(discriminator, kind.as_str(), "Step"))
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parallel execution settings shared by every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParallelOptions {
    pub parallel_count: Option<i64>,
    pub fail_on_parallel_failures: Option<GroupClause>,
}

impl ParallelOptions {
    pub fn parallel_count(&self) -> Option<u32> {
        self.parallel_count.and_then(|count| u32::try_from(count).ok())
    }

    pub fn fail_on_parallel_failures(&self) -> GroupClause {
        self.fail_on_parallel_failures.unwrap_or_default()
    }
}

/// A configured unit of work.
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> StepKind;

    /// How many copies run concurrently. `None`, 0 and 1 all mean one.
    fn parallel_count(&self) -> Option<u32>;

    fn fail_on_parallel_failures(&self) -> GroupClause;

    /// Runs the step once. Errors are configuration faults, not simulated
    /// ones.
    fn execute(&self) -> BoxFuture<'_, Result<ExecutionStatus, EngineError>>;

    /// The outbound-HTTP capability, used when wiring clients.
    fn as_request_step(&self) -> Option<&RequestStep> {
        None
    }
}

impl fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Builds steps from raw configuration entries.
pub trait StepFactory: Send + Sync {
    /// `Ok(None)` marks a malformed entry; errors are fatal.
    fn create(&self, name: &str, raw: &str) -> Result<Option<Arc<dyn Step>>, EngineError>;
}

/// Builds the four built-in step kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStepFactory {
    seed: Option<u64>,
}

impl DefaultStepFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every error step that has no `seed` of its own.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl StepFactory for DefaultStepFactory {
    fn create(&self, name: &str, raw: &str) -> Result<Option<Arc<dyn Step>>, EngineError> {
        ensure_not_blank(name, "step name")?;

        let envelope = match envelope::parse(raw, "step") {
            Ok(envelope) => envelope,
            Err(EnvelopeError::Malformed(err)) => return Ok(malformed(name, &err)),
            Err(EnvelopeError::Invalid(reason)) => {
                return Err(EngineError::invalid(EntryKind::Step, name, reason))
            }
        };
        let kind = StepKind::resolve(&envelope.type_name).ok_or_else(|| {
            EngineError::invalid(
                EntryKind::Step,
                name,
                format!("unknown step type '{}'", envelope.type_name),
            )
        })?;

        let step: Arc<dyn Step> = match kind {
            StepKind::Delay => match body::<DelayConfig>(name, envelope.body) {
                Some(config) => Arc::new(DelayStep::new(name, config)?),
                None => return Ok(None),
            },
            StepKind::Load => match body::<LoadConfig>(name, envelope.body) {
                Some(config) => Arc::new(LoadStep::new(name, config)?),
                None => return Ok(None),
            },
            StepKind::Error => match body::<ErrorConfig>(name, envelope.body) {
                Some(mut config) => {
                    config.seed = config.seed.or(self.seed);
                    Arc::new(ErrorStep::new(name, config)?)
                }
                None => return Ok(None),
            },
            StepKind::Request => match body::<RequestConfig>(name, envelope.body) {
                Some(config) => Arc::new(RequestStep::new(name, config)),
                None => return Ok(None),
            },
        };

        tracing::debug!(step = %name, kind = %kind, "Registered step");
        Ok(Some(step))
    }
}

fn body<T: DeserializeOwned>(name: &str, body: serde_json::Value) -> Option<T> {
    match serde_json::from_value(body) {
        Ok(config) => Some(config),
        Err(err) => malformed(name, &err),
    }
}

fn malformed<T>(name: &str, err: &serde_json::Error) -> Option<T> {
    tracing::warn!(step = %name, error = %err, "Ignoring malformed step configuration");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_kind() {
        let factory = DefaultStepFactory::with_seed(1);
        let cases = [
            (r#"{"type":"Delay","step":{"time":0.1}}"#, StepKind::Delay),
            (r#"{"type":"loadstep","step":{"timeInSeconds":1,"cpuPercentage":10}}"#, StepKind::Load),
            (r#"{"type":"ERROR","step":{"probability":0.5}}"#, StepKind::Error),
            (
                r#"{"type":"Request","step":{"clientName":"c","path":"/x","method":"GET"}}"#,
                StepKind::Request,
            ),
        ];
        for (raw, kind) in cases {
            let step = factory.create("s", raw).unwrap().unwrap();
            assert_eq!(step.kind(), kind);
            assert_eq!(step.name(), "s");
        }
    }

    #[test]
    fn reads_parallel_options() {
        let step = DefaultStepFactory::new()
            .create(
                "fanout",
                r#"{"type":"Delay","step":{"time":0,"parallelCount":4,"failOnParallelFailures":"all"}}"#,
            )
            .unwrap()
            .unwrap();
        assert_eq!(step.parallel_count(), Some(4));
        assert_eq!(step.fail_on_parallel_failures(), GroupClause::All);
        assert!(step.as_request_step().is_none());
    }

    #[test]
    fn unknown_type_is_fatal_and_bad_json_is_skipped() {
        let factory = DefaultStepFactory::new();
        assert!(matches!(
            factory.create("s", r#"{"type":"Sleep","step":{}}"#),
            Err(EngineError::InvalidConfig { .. })
        ));
        assert!(factory.create("s", "not json").unwrap().is_none());
        assert!(factory
            .create("s", r#"{"type":"Delay","step":{"time":"soon"}}"#)
            .unwrap()
            .is_none());
        assert!(matches!(
            factory.create("", "{}"),
            Err(EngineError::Blank { .. })
        ));
    }

    #[test]
    fn out_of_range_values_are_fatal() {
        let factory = DefaultStepFactory::new();
        for raw in [
            r#"{"type":"Delay","step":{"time":-1}}"#,
            r#"{"type":"Error","step":{"probability":1.5}}"#,
            r#"{"type":"Load","step":{"cpuPercentage":101}}"#,
        ] {
            assert!(
                matches!(factory.create("s", raw), Err(EngineError::InvalidConfig { .. })),
                "{raw}"
            );
        }
    }
}
