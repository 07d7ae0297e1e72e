use super::AsPolicy;
use crate::PolicyConfigError;
use faultline_core::Policy;
use faultline_fallback::FallbackLayer;
use serde::Deserialize;

/// `{ status, reason?, content? }`: the response substituted for handled
/// failures. `content` is sent verbatim as a UTF-8 JSON body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FallbackConfig {
    pub status: i32,
    pub reason: Option<String>,
    pub content: Option<String>,
}

impl FallbackConfig {
    pub fn layer(&self, name: &str) -> Result<FallbackLayer, PolicyConfigError> {
        let status = u16::try_from(self.status).map_err(|_| {
            PolicyConfigError::out_of_range(
                name,
                "status",
                format!("must be between 0 and {}, got {}", u16::MAX, self.status),
            )
        })?;

        let mut builder = FallbackLayer::builder().name(name).status(status);
        if let Some(reason) = &self.reason {
            builder = builder.reason(reason.clone());
        }
        if let Some(content) = &self.content {
            builder = builder.content(content.clone());
        }
        Ok(builder.build())
    }
}

impl AsPolicy for FallbackConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
