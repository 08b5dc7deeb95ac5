//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading incentive
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeCategory, RuleDefinition, RuleId};

use super::types::{
    Bucket, BucketCatalog, IncentiveConfig, ProgressionConfig, ProgressionTable, RuleCatalog,
    RulesConfig, SchemeConfig, SchemeMetadata,
};

/// Loads and provides access to incentive configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── incentive.yaml    # Scheme metadata and reconciliation tolerance
/// ├── rules.yaml        # The ten eligibility rules
/// ├── buckets.yaml      # Ordered title buckets per category
/// └── progression.yaml  # Counter to payout table
/// ```
///
/// # Example
///
/// ```no_run
/// use incentive_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Loaded scheme: {}", loader.scheme().name);
/// println!("Progression cap: {}", loader.config().progression().cap());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: IncentiveConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any file is missing (`ConfigNotFound`), contains
    /// invalid YAML (`ConfigParseError`), or violates a catalog or table
    /// invariant (`InvalidConfig`).
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let scheme = Self::load_yaml::<SchemeConfig>(&path.join("incentive.yaml"))?;
        let rules = Self::load_yaml::<RulesConfig>(&path.join("rules.yaml"))?;
        let buckets = Self::load_yaml::<BucketCatalog>(&path.join("buckets.yaml"))?;
        let progression = Self::load_yaml::<ProgressionConfig>(&path.join("progression.yaml"))?;

        let config = IncentiveConfig::new(
            scheme,
            RuleCatalog::new(rules.rules)?,
            buckets,
            ProgressionTable::try_from(progression)?,
        )?;

        debug!(
            path = %path.display(),
            scheme = %config.scheme().code,
            cap = config.progression().cap(),
            "Loaded incentive configuration"
        );

        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    pub fn from_config(config: IncentiveConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying incentive configuration.
    pub fn config(&self) -> &IncentiveConfig {
        &self.config
    }

    /// Returns the scheme metadata.
    pub fn scheme(&self) -> &SchemeMetadata {
        self.config.scheme()
    }

    /// Gets a rule definition by id.
    pub fn get_rule(&self, id: RuleId) -> EngineResult<&RuleDefinition> {
        self.config
            .rules()
            .get(id)
            .ok_or_else(|| EngineError::InvalidRuleId {
                value: i64::from(id.get()),
            })
    }

    /// Gets a bucket of a category by its id, including the default bucket.
    pub fn get_bucket(&self, category: EmployeeCategory, bucket_id: &str) -> Option<&Bucket> {
        let group = self.config.buckets().for_category(category);
        group
            .buckets
            .iter()
            .chain(std::iter::once(&group.default))
            .find(|b| b.id == bucket_id)
    }
}
