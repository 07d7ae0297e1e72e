//! Declarative policy configuration for faultline.
//!
//! A policy setting is a JSON document naming a policy kind and its
//! parameters:
//!
//! ```json
//! { "type": "Retry", "policy": { "retries": 3, "delaysInSeconds": [0.5, 1] } }
//! ```
//!
//! [`PolicySetting::from_json`] resolves the `type` discriminator against the
//! closed [`PolicyKind`] table and deserializes the nested model. Each model
//! validates its numeric ranges when compiled through [`AsPolicy`], producing
//! a [`Policy`] backed by the matching layer crate.
//!
//! ```rust
//! use faultline_policy::{DefaultPolicyFactory, PolicyFactory};
//!
//! let factory = DefaultPolicyFactory::new();
//! let policy = factory
//!     .create("api-breaker", r#"{"type":"CircuitBreaker","policy":{"breakDuration":5,"faultTolerance":3}}"#)
//!     .unwrap()
//!     .expect("well-formed setting");
//! assert_eq!(policy.name(), "api-breaker");
//!
//! // Malformed JSON is skipped, not fatal.
//! assert!(factory.create("broken", "{").unwrap().is_none());
//! ```
//!
//! [`Policy`]: faultline_core::Policy

mod error;
mod factory;
mod kind;
pub mod model;
mod setting;

pub use error::PolicyConfigError;
pub use factory::{DefaultPolicyFactory, PolicyFactory};
pub use kind::PolicyKind;
pub use model::AsPolicy;
pub use setting::{PolicySetting, SettingError};
