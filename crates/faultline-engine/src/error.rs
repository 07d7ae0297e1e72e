use crate::status::ExecutionStatus;
use faultline_policy::PolicyConfigError;
use std::fmt;

/// The four kinds of named registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Step,
    Processor,
    Policy,
    Client,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Step => "step",
            EntryKind::Processor => "processor",
            EntryKind::Policy => "policy",
            EntryKind::Client => "client",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading configuration, wiring clients or running
/// processors.
///
/// Simulated faults are never errors; they surface as
/// [`ExecutionStatus::SimulatedFail`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A caller passed an empty or whitespace-only name.
    #[error("{what} must not be blank")]
    Blank { what: &'static str },

    #[error("configuration document is invalid: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("configuration section '{0}' is missing")]
    MissingSection(crate::source::Section),

    /// The name is unknown or its configuration was malformed.
    #[error("{kind} '{name}' is not registered or its configuration is malformed")]
    NotFound { kind: EntryKind, name: String },

    #[error("processor '{0}' cannot be triggered by a request")]
    NotRequestProcessor(String),

    #[error("{kind} '{name}' is invalid: {reason}")]
    InvalidConfig {
        kind: EntryKind,
        name: String,
        reason: String,
    },

    #[error(transparent)]
    Policy(#[from] PolicyConfigError),

    #[error("client '{0}' has no policy list")]
    MissingClientPolicies(String),

    #[error("request step '{0}' is already configured")]
    AlreadyConfigured(String),

    #[error("request step '{0}' has no HTTP client configured")]
    NotConfigured(String),

    #[error("request step '{step}' has reuseHttpMessageHandler = {reuse} and cannot take that client")]
    ReuseModeMismatch { step: String, reuse: bool },

    #[error("startup processor '{processor}' finished with {status}")]
    StartupFailed {
        processor: String,
        status: ExecutionStatus,
    },

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}

impl EngineError {
    pub(crate) fn invalid(kind: EntryKind, name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            kind,
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: EntryKind, name: &str) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    /// True when the caller misused the API rather than the configuration
    /// being wrong.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, EngineError::Blank { .. })
    }
}

pub(crate) fn ensure_not_blank(value: &str, what: &'static str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        Err(EngineError::Blank { what })
    } else {
        Ok(())
    }
}
