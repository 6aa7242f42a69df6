use serde::{Deserialize, Serialize};

use crate::error::{Result, VeloqError};

/// What a schema-stable operator does when the batch stream changes shape
/// under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDriftPolicy {
    /// Surface a schema-change error and stop the stream.
    Fail,
    /// Log the change and keep going; downstream recompiles against the new
    /// schema version.
    Adapt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub batch_size_rows: usize,
    pub schema_drift_policy: SchemaDriftPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size_rows: 8192,
            schema_drift_policy: SchemaDriftPolicy::Fail,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size_rows == 0 {
            return Err(VeloqError::InvalidConfig(
                "batch_size_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
