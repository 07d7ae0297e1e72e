//! Step registry and execution engine for faultline.
//!
//! A configuration document declares four sections. Steps are units of
//! simulated work, processors are ordered step lists, policies are
//! resilience settings and clients are named HTTP endpoints with a policy
//! stack:
//!
//! ```rust
//! use faultline_engine::{Engine, Factories, JsonConfigurationSource, OutcomeStatus, Registry};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), faultline_engine::EngineError> {
//! let source = JsonConfigurationSource::parse(r#"{
//!     "Steps": {
//!         "wait": { "type": "Delay", "step": { "time": 0.01 } },
//!         "flaky": { "type": "Error", "step": { "probability": 0, "parallelCount": 4 } }
//!     },
//!     "Processors": {
//!         "checkout": { "type": "Request", "processor": { "steps": ["wait", "flaky"] } }
//!     },
//!     "Policies": {},
//!     "Clients": {}
//! }"#)?;
//!
//! let registry = Arc::new(Registry::new(&source, &Factories::default())?);
//! let engine = Engine::new(registry);
//!
//! let outcome = engine.process_request("checkout").await?;
//! assert_eq!(outcome.status, OutcomeStatus::Success);
//! # Ok(())
//! # }
//! ```
//!
//! Request steps need an HTTP client before they run; bind them once with
//! [`Registry::configure_http_clients`].
//!
//! ## Failures
//!
//! A step reporting [`ExecutionStatus::SimulatedFail`] ends the processor
//! with [`OutcomeStatus::SimulatedFault`], anything else that is not a
//! success ends it with [`OutcomeStatus::UnexpectedFault`]. Unknown names and
//! bad configuration are [`EngineError`]s and are never turned into an
//! outcome.

mod engine;
mod envelope;
pub mod client;
pub mod error;
pub mod http;
pub mod payload;
pub mod processor;
pub mod registry;
pub mod source;
pub mod status;
pub mod step;

pub use client::{ClientConfig, ClientFactory, DefaultClientFactory};
pub use engine::{Engine, OutcomeStatus, ProcessorOutcome, StatusCodes};
pub use error::{EngineError, EntryKind};
pub use http::{HttpClient, HttpClientFactory, ReqwestClientFactory};
pub use processor::{DefaultProcessorFactory, Processor, ProcessorConfig, ProcessorFactory, ProcessorKind};
pub use registry::{Factories, Registry};
pub use source::{ConfigurationSource, JsonConfigurationSource, Section};
pub use status::{aggregate, ExecutionStatus, GroupClause};
pub use step::{DefaultStepFactory, Step, StepFactory, StepKind};
