//! Named step pipelines.
//!
//! Processor settings use the envelope `{ "type": <kind>, "processor": { ... } }`
//! where the kind is `Request` or `Startup` (a trailing `Processor` is
//! accepted, case is ignored).

use crate::envelope::{self, EnvelopeError};
use crate::error::{ensure_not_blank, EntryKind};
use crate::payload::{self, PayloadConfig};
use crate::EngineError;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

/// `{ steps, ingressLatencyMilliseconds, successPayload?, errorPayload?,
/// asynchronous }`. `asynchronous` only applies to startup processors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorConfig {
    /// Step names in execution order. Repeats are allowed.
    pub steps: Vec<String>,
    pub ingress_latency_milliseconds: i64,
    pub success_payload: Option<PayloadConfig>,
    pub error_payload: Option<PayloadConfig>,
    pub asynchronous: bool,
}

/// When a processor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    /// Run on demand by name.
    Request,
    /// Run once at startup; asynchronous ones run in the background.
    Startup { asynchronous: bool },
}

#[derive(Debug, Clone)]
pub struct Processor {
    name: String,
    kind: ProcessorKind,
    steps: Vec<String>,
    ingress_latency: Duration,
    success_payload: Option<Bytes>,
    error_payload: Option<Bytes>,
}

impl Processor {
    pub fn new(name: &str, kind: ProcessorKind, config: ProcessorConfig) -> Result<Self, EngineError> {
        let ingress = u64::try_from(config.ingress_latency_milliseconds).map_err(|_| {
            EngineError::invalid(
                EntryKind::Processor,
                name,
                format!(
                    "ingressLatencyMilliseconds must not be negative, got {}",
                    config.ingress_latency_milliseconds
                ),
            )
        })?;
        let body = |payload: Option<PayloadConfig>, field: &str| -> Result<Option<Bytes>, EngineError> {
            payload
                .map(|payload| {
                    let size = usize::try_from(payload.size).map_err(|_| {
                        EngineError::invalid(
                            EntryKind::Processor,
                            name,
                            format!("{field}.size must not be negative, got {}", payload.size),
                        )
                    })?;
                    payload::generate(size).map_err(|err| {
                        EngineError::invalid(
                            EntryKind::Processor,
                            name,
                            format!("{field}.size {size} cannot be allocated: {err}"),
                        )
                    })
                })
                .transpose()
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            steps: config.steps,
            ingress_latency: Duration::from_millis(ingress),
            success_payload: body(config.success_payload, "successPayload")?,
            error_payload: body(config.error_payload, "errorPayload")?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProcessorKind {
        self.kind
    }

    pub fn is_request(&self) -> bool {
        matches!(self.kind, ProcessorKind::Request)
    }

    pub fn is_startup(&self) -> bool {
        matches!(self.kind, ProcessorKind::Startup { .. })
    }

    pub fn is_asynchronous(&self) -> bool {
        matches!(self.kind, ProcessorKind::Startup { asynchronous: true })
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn ingress_latency(&self) -> Duration {
        self.ingress_latency
    }

    pub fn success_payload(&self) -> Option<&Bytes> {
        self.success_payload.as_ref()
    }

    pub fn error_payload(&self) -> Option<&Bytes> {
        self.error_payload.as_ref()
    }
}

/// Builds processors from raw configuration entries.
pub trait ProcessorFactory: Send + Sync {
    /// `Ok(None)` marks a malformed entry; errors are fatal.
    fn create(&self, name: &str, raw: &str) -> Result<Option<Processor>, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProcessorFactory;

impl ProcessorFactory for DefaultProcessorFactory {
    fn create(&self, name: &str, raw: &str) -> Result<Option<Processor>, EngineError> {
        ensure_not_blank(name, "processor name")?;

        let envelope = match envelope::parse(raw, "processor") {
            Ok(envelope) => envelope,
            Err(EnvelopeError::Malformed(err)) => {
                tracing::warn!(processor = %name, error = %err, "Ignoring malformed processor configuration");
                return Ok(None);
            }
            Err(EnvelopeError::Invalid(reason)) => {
                return Err(EngineError::invalid(EntryKind::Processor, name, reason))
            }
        };

        let config: ProcessorConfig = match serde_json::from_value(envelope.body) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(processor = %name, error = %err, "Ignoring malformed processor configuration");
                return Ok(None);
            }
        };

        let kind = if envelope::names(&envelope.type_name, "Request", "Processor") {
            ProcessorKind::Request
        } else if envelope::names(&envelope.type_name, "Startup", "Processor") {
            ProcessorKind::Startup {
                asynchronous: config.asynchronous,
            }
        } else {
            return Err(EngineError::invalid(
                EntryKind::Processor,
                name,
                format!("unknown processor type '{}'", envelope.type_name),
            ));
        };

        Processor::new(name, kind, config).map(Some)
    }
}
