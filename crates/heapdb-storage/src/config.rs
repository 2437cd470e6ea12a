use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{statistics::DEFAULT_HISTOGRAM_BUCKETS, StorageError};

/// heapdb configuration, usually read from `heapdb.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub statistics: StatisticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Pages kept in the buffer pool (default: 50)
    pub buffer_pool_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Buckets per column histogram (default: 100, minimum 100)
    pub histogram_buckets: usize,
    /// Cost of reading one page (default: 1000)
    pub io_cost_per_page: f64,
    /// What `recompute_all` does when one table fails to build
    pub recompute_policy: RecomputePolicy,
}

/// Failure handling for a registry-wide statistics recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecomputePolicy {
    /// Log the failure, keep the table's previous statistics, continue with the rest.
    #[default]
    ContinueOnError,
    /// Publish nothing unless every table builds.
    AbortOnError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { buffer_pool_pages: crate::buffer::DEFAULT_CAPACITY }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
            io_cost_per_page: 1000.0,
            recompute_policy: RecomputePolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl StatisticsConfig {
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.histogram_buckets < DEFAULT_HISTOGRAM_BUCKETS {
            return Err(StorageError::InvalidConfig(format!(
                "statistics.histogram_buckets must be at least {}, got {}",
                DEFAULT_HISTOGRAM_BUCKETS, self.histogram_buckets
            )));
        }
        if !(self.io_cost_per_page.is_finite() && self.io_cost_per_page > 0.0) {
            return Err(StorageError::InvalidConfig(format!(
                "statistics.io_cost_per_page must be positive, got {}",
                self.io_cost_per_page
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, StorageError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        self.statistics.validate()
    }
}
