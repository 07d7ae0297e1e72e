//! Bulkhead policy for faultline.
//!
//! At most `max_parallelization` calls run at once. When every slot is busy,
//! up to `max_queuing_actions` callers wait for one; anyone beyond that is
//! rejected immediately with [`PolicyError::BulkheadRejected`].
//!
//! # Examples
//!
//! ```rust
//! use faultline_bulkhead::BulkheadLayer;
//! use faultline_core::{HttpRequest, HttpResponse, PolicyError};
//! use tower::{Layer, service_fn};
//!
//! let layer = BulkheadLayer::builder()
//!     .max_parallelization(4)
//!     .max_queuing_actions(8)
//!     .name("reports")
//!     .on_call_rejected(|| eprintln!("bulkhead full"))
//!     .build();
//!
//! let svc = layer.layer(service_fn(|_req: HttpRequest| async {
//!     Ok::<_, PolicyError>(HttpResponse::new(200))
//! }));
//! ```
//!
//! [`PolicyError::BulkheadRejected`]: faultline_core::PolicyError::BulkheadRejected

mod config;
mod events;
mod layer;
mod service;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use events::BulkheadEvent;
pub use layer::BulkheadLayer;
pub use service::Bulkhead;
