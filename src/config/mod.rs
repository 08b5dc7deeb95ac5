//! Configuration loading and management for the Incentive Engine.
//!
//! This module provides functionality to load incentive configurations from
//! YAML files: the rule catalog, the bucket catalog, and the progression table.
//!
//! # Example
//!
//! ```no_run
//! use incentive_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded scheme: {}", config.scheme().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    Bucket, BucketCatalog, CategoryBuckets, IncentiveConfig, ProgressionConfig, ProgressionTable,
    Reclassification, ReconciliationSettings, RuleCatalog, RulesConfig, SchemeConfig,
    SchemeMetadata, TitlePattern, normalize_title,
};
