//! The error type shared by every policy layer.
//!
//! All layers in a composed policy speak [`PolicyError`], so they stack in any
//! order without conversion glue. Transport failures coming out of the HTTP
//! client are folded into [`PolicyError::Transport`].
//!
//! ```rust
//! use faultline_core::PolicyError;
//! use std::time::Duration;
//!
//! let err = PolicyError::timeout("upstream-timeout", Duration::from_secs(2));
//! assert!(err.is_timeout());
//! assert!(err.is_handled());
//! ```

use std::time::Duration;

/// Failure produced by a compiled policy pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The HTTP call itself failed (connection refused, reset, invalid response...).
    #[error("transport error: {0}")]
    Transport(String),

    /// A timeout policy gave up waiting.
    #[error("policy '{policy}' timed out after {after:?}")]
    Timeout {
        /// Name of the timeout policy.
        policy: String,
        /// Configured timeout.
        after: Duration,
    },

    /// A circuit breaker is open or its half-open trial slot is taken.
    #[error("circuit '{name}' is open")]
    CircuitOpen {
        /// Name of the circuit breaker policy.
        name: String,
    },

    /// A bulkhead had neither a free execution slot nor a free queue slot.
    #[error(
        "bulkhead '{name}' rejected the call (max parallelization {max_parallelization}, max queuing actions {max_queuing_actions})"
    )]
    BulkheadRejected {
        /// Name of the bulkhead policy.
        name: String,
        /// Concurrent execution slots.
        max_parallelization: usize,
        /// Waiting slots.
        max_queuing_actions: usize,
    },

    /// The call was abandoned before producing a result.
    #[error("call was cancelled")]
    Cancelled,
}

impl PolicyError {
    /// Builds a transport error from anything displayable.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        PolicyError::Transport(err.to_string())
    }

    /// Builds a timeout error.
    pub fn timeout(policy: impl Into<String>, after: Duration) -> Self {
        PolicyError::Timeout {
            policy: policy.into(),
            after,
        }
    }

    /// Builds a circuit-open error.
    pub fn circuit_open(name: impl Into<String>) -> Self {
        PolicyError::CircuitOpen { name: name.into() }
    }

    /// Returns true for failures that retry, circuit breaker and fallback
    /// policies react to.
    ///
    /// Transport errors, timeouts and open circuits are handled; bulkhead
    /// rejections and cancellations pass through untouched.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            PolicyError::Transport(_) | PolicyError::Timeout { .. } | PolicyError::CircuitOpen { .. }
        )
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PolicyError::Timeout { .. })
    }

    /// Returns true if this is a circuit-open error.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, PolicyError::CircuitOpen { .. })
    }

    /// Returns true if this is a bulkhead rejection.
    pub fn is_bulkhead_rejected(&self) -> bool {
        matches!(self, PolicyError::BulkheadRejected { .. })
    }

    /// Returns true if this is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, PolicyError::Transport(_))
    }
}
