use crate::PolicyKind;

/// Fatal failure while turning a policy setting into a [`Policy`].
///
/// Malformed JSON is not an error: the factory logs it and yields no policy.
///
/// [`Policy`]: faultline_core::Policy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyConfigError {
    #[error("policy setting must not be blank")]
    Blank,

    #[error("unknown policy type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("policy setting of type {kind} has no 'policy' object")]
    MissingPolicy { kind: PolicyKind },

    /// A numeric field is outside its documented range.
    #[error("policy '{policy}': {field} {reason}")]
    OutOfRange {
        policy: String,
        field: &'static str,
        reason: String,
    },
}

impl PolicyConfigError {
    pub(crate) fn out_of_range(policy: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            policy: policy.to_string(),
            field,
            reason: reason.into(),
        }
    }
}
