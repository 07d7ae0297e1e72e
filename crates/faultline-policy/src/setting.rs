//! The `{ "type": ..., "policy": { ... } }` envelope.

use crate::model::{
    AdvancedCircuitBreakerConfig, AsPolicy, BulkheadConfig, CacheConfig, CircuitBreakerConfig,
    FallbackConfig, RetryConfig, TimeoutConfig,
};
use crate::{PolicyConfigError, PolicyKind};
use faultline_core::Policy;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A policy setting resolved to its typed model.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicySetting {
    Retry(RetryConfig),
    Timeout(TimeoutConfig),
    CircuitBreaker(CircuitBreakerConfig),
    AdvancedCircuitBreaker(AdvancedCircuitBreakerConfig),
    Bulkhead(BulkheadConfig),
    Cache(CacheConfig),
    Fallback(FallbackConfig),
}

/// Why a setting could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum SettingError {
    /// The document or the nested model is not well formed. Recoverable: the
    /// entry is skipped.
    #[error("malformed policy setting: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] PolicyConfigError),
}

impl PolicySetting {
    /// Parses the envelope and the nested model.
    ///
    /// Envelope keys match case-insensitively. An unknown `type` and a
    /// missing or null `policy` are [`SettingError::Invalid`]; everything
    /// else that fails to parse is [`SettingError::Malformed`].
    pub fn from_json(raw: &str) -> Result<Self, SettingError> {
        if raw.trim().is_empty() {
            return Err(PolicyConfigError::Blank.into());
        }

        let document: Value = serde_json::from_str(raw)?;
        let Value::Object(envelope) = document else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "policy setting must be a JSON object",
            )
            .into());
        };

        let kind = match field(&envelope, "type") {
            Some(Value::String(name)) => {
                PolicyKind::resolve(name).ok_or_else(|| PolicyConfigError::UnknownType {
                    type_name: name.clone(),
                })?
            }
            other => {
                return Err(PolicyConfigError::UnknownType {
                    type_name: other.map(Value::to_string).unwrap_or_default(),
                }
                .into())
            }
        };

        let policy = match field(&envelope, "policy") {
            Some(Value::Null) | None => return Err(PolicyConfigError::MissingPolicy { kind }.into()),
            Some(policy) => policy.clone(),
        };

        Ok(match kind {
            PolicyKind::Retry => Self::Retry(model(policy)?),
            PolicyKind::Timeout => Self::Timeout(model(policy)?),
            PolicyKind::CircuitBreaker => Self::CircuitBreaker(model(policy)?),
            PolicyKind::AdvancedCircuitBreaker => Self::AdvancedCircuitBreaker(model(policy)?),
            PolicyKind::Bulkhead => Self::Bulkhead(model(policy)?),
            PolicyKind::Cache => Self::Cache(model(policy)?),
            PolicyKind::Fallback => Self::Fallback(model(policy)?),
        })
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Retry(_) => PolicyKind::Retry,
            Self::Timeout(_) => PolicyKind::Timeout,
            Self::CircuitBreaker(_) => PolicyKind::CircuitBreaker,
            Self::AdvancedCircuitBreaker(_) => PolicyKind::AdvancedCircuitBreaker,
            Self::Bulkhead(_) => PolicyKind::Bulkhead,
            Self::Cache(_) => PolicyKind::Cache,
            Self::Fallback(_) => PolicyKind::Fallback,
        }
    }
}

impl AsPolicy for PolicySetting {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        match self {
            Self::Retry(config) => config.as_policy(name),
            Self::Timeout(config) => config.as_policy(name),
            Self::CircuitBreaker(config) => config.as_policy(name),
            Self::AdvancedCircuitBreaker(config) => config.as_policy(name),
            Self::Bulkhead(config) => config.as_policy(name),
            Self::Cache(config) => config.as_policy(name),
            Self::Fallback(config) => config.as_policy(name),
        }
    }
}

fn field<'a>(envelope: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    envelope
        .get(key)
        .or_else(|| {
            envelope
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
}

fn model<T: DeserializeOwned>(policy: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(policy)
}
