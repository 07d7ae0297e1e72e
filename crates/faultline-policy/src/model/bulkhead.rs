use super::AsPolicy;
use crate::PolicyConfigError;
use faultline_bulkhead::BulkheadLayer;
use faultline_core::Policy;
use serde::Deserialize;

/// `{ maxParallelization, maxQueuingActions? }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BulkheadConfig {
    pub max_parallelization: i32,
    /// No queue when unset.
    pub max_queuing_actions: Option<i32>,
}

impl BulkheadConfig {
    pub fn layer(&self, name: &str) -> Result<BulkheadLayer, PolicyConfigError> {
        if self.max_parallelization < 1 {
            return Err(PolicyConfigError::out_of_range(
                name,
                "maxParallelization",
                format!("must be at least 1, got {}", self.max_parallelization),
            ));
        }
        let queue = match self.max_queuing_actions {
            None => 0,
            Some(queue) if queue >= 1 => queue as usize,
            Some(queue) => {
                return Err(PolicyConfigError::out_of_range(
                    name,
                    "maxQueuingActions",
                    format!("must be at least 1 when set, got {queue}"),
                ))
            }
        };

        Ok(BulkheadLayer::builder()
            .max_parallelization(self.max_parallelization as usize)
            .max_queuing_actions(queue)
            .name(name)
            .build())
    }
}

impl AsPolicy for BulkheadConfig {
    fn as_policy(&self, name: &str) -> Result<Policy, PolicyConfigError> {
        Ok(Policy::from_layer(name, self.layer(name)?))
    }
}
