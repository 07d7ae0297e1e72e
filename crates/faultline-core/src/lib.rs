//! Core infrastructure for faultline.
//!
//! This crate provides what every policy layer and the engine share:
//! - The transport-neutral HTTP model ([`HttpRequest`], [`HttpResponse`], [`ExecutionContext`])
//! - [`PolicyError`] and the handled-failure classification
//! - [`Policy`], a named type-erased layer that composes outermost-first
//! - The event system used for observability

pub mod error;
pub mod events;
pub mod http;
pub mod policy;

pub use error::PolicyError;
pub use events::{EventListener, EventListeners, FnListener, PolicyEvent};
pub use http::{
    is_handled_failure, ExecutionContext, HttpMethod, HttpRequest, HttpResponse, HttpResult,
    UnsupportedMethod,
};
pub use policy::{HttpService, Policy};
