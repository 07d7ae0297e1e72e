use crate::model::AsPolicy;
use crate::setting::{PolicySetting, SettingError};
use crate::PolicyConfigError;
use faultline_core::Policy;

/// Turns a named policy setting into an executable [`Policy`].
pub trait PolicyFactory: Send + Sync {
    /// Compiles `raw`, a `{ "type": ..., "policy": { ... } }` document.
    ///
    /// Returns `Ok(None)` for malformed JSON so one bad entry does not abort
    /// a whole configuration load. Unknown types, missing `policy` objects
    /// and out-of-range values are errors.
    fn create(&self, name: &str, raw: &str) -> Result<Option<Policy>, PolicyConfigError>;
}

/// The built-in factory for every [`PolicyKind`](crate::PolicyKind).
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyFactory {
    seed: Option<u64>,
}

impl DefaultPolicyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jitter of every retry policy that does not carry its own
    /// seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl PolicyFactory for DefaultPolicyFactory {
    fn create(&self, name: &str, raw: &str) -> Result<Option<Policy>, PolicyConfigError> {
        if name.trim().is_empty() {
            return Err(PolicyConfigError::Blank);
        }

        let mut setting = match PolicySetting::from_json(raw) {
            Ok(setting) => setting,
            Err(SettingError::Malformed(err)) => {
                tracing::warn!(policy = %name, error = %err, "Ignoring malformed policy setting");
                return Ok(None);
            }
            Err(SettingError::Invalid(err)) => return Err(err),
        };

        if let PolicySetting::Retry(retry) = &mut setting {
            retry.seed = retry.seed.or(self.seed);
        }

        let policy = setting.as_policy(name)?;
        tracing::debug!(policy = %name, kind = %setting.kind(), "Compiled policy");
        Ok(Some(policy))
    }
}
