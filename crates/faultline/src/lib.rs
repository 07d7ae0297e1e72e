//! Configurable fault and latency emulator.
//!
//! `faultline` turns a declarative configuration into scripted chaos: a
//! request names a *processor*, the processor expands into *steps* (delay,
//! CPU and memory load, probabilistic error, outbound HTTP call), and HTTP
//! calls go through named clients wrapped in resilience *policies*.
//!
//! # Crates
//!
//! - [`core`]: HTTP model, [`Policy`](core::Policy) composition, errors, events
//! - [`retry`], [`timeout`], [`circuitbreaker`], [`bulkhead`], [`cache`],
//!   [`fallback`]: one Tower layer per resilience policy
//! - [`policy`]: JSON policy settings and the policy factory
//! - [`engine`]: steps, processors, clients, the registry and the engine
//!
//! # Example
//!
//! ```rust,no_run
//! use faultline::engine::{Engine, Factories, JsonConfigurationSource, Registry, ReqwestClientFactory};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), faultline::engine::EngineError> {
//! let source = JsonConfigurationSource::parse(&std::fs::read_to_string("faultline.json").unwrap())?;
//! let registry = Registry::new(&source, &Factories::default())?;
//! registry.configure_http_clients(Arc::new(registry.pooled_client_factory()?))?;
//!
//! let engine = Engine::new(Arc::new(registry));
//! engine.process_startup_actions().await?;
//!
//! let outcome = engine.process_request("checkout").await?;
//! println!("{} ({:?} bytes)", engine.status_code(&outcome), outcome.payload.map(|p| p.len()));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tracing`: structured logs inside every policy layer
//! - `metrics`: counters and gauges through the `metrics` facade
//! - `full`: both

pub use faultline_bulkhead as bulkhead;
pub use faultline_cache as cache;
pub use faultline_circuitbreaker as circuitbreaker;
pub use faultline_core as core;
pub use faultline_engine as engine;
pub use faultline_fallback as fallback;
pub use faultline_policy as policy;
pub use faultline_retry as retry;
pub use faultline_timeout as timeout;

pub use faultline_engine::{Engine, EngineError, ProcessorOutcome, Registry};
