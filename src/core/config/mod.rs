use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// Parameters of a concurrent put/get stress run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StressConfig {
    /// Number of producer threads.
    pub producers: usize,
    /// Items each producer puts.
    pub items_per_producer: usize,
    /// NDJSON file the run record is appended to.
    pub report_path: Option<PathBuf>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            producers: 4,
            items_per_producer: 1_000,
            report_path: None,
        }
    }
}

impl StressConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StressConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producers == 0 {
            return Err(ConfigError::Invalid("producers must be at least 1".into()));
        }
        if self.items_per_producer == 0 {
            return Err(ConfigError::Invalid(
                "items_per_producer must be at least 1".into(),
            ));
        }
        if self.producers.checked_mul(self.items_per_producer).is_none() {
            return Err(ConfigError::Invalid("total item count overflows".into()));
        }
        Ok(())
    }

    /// Items the consumer must receive.
    pub fn expected(&self) -> usize {
        self.producers * self.items_per_producer
    }
}
