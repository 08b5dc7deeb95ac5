//! Configuration types for incentive evaluation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and the validation that
//! turns them into an [`IncentiveConfig`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeCategory, PayoutMode, RuleDefinition, RuleId};

/// Metadata about the incentive scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeMetadata {
    /// Short scheme code (e.g., "FACTORY-PI").
    pub code: String,
    /// The human-readable name of the scheme.
    pub name: String,
    /// The version or effective date of the scheme.
    pub version: String,
    /// ISO currency code of all amounts.
    pub currency: String,
    /// Decimal places amounts are rounded to (toward zero).
    #[serde(default)]
    pub currency_scale: u32,
}

/// Settings for comparing computed results against a reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationSettings {
    /// Payout differences up to this amount are not reported.
    pub tolerance: Decimal,
}

/// incentive.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeConfig {
    /// Scheme metadata.
    pub scheme: SchemeMetadata,
    /// Reconciliation settings.
    pub reconciliation: ReconciliationSettings,
}

/// rules.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// The rule definitions.
    pub rules: Vec<RuleDefinition>,
}

/// The ten rule definitions, keyed by id.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: BTreeMap<RuleId, RuleDefinition>,
}

impl RuleCatalog {
    /// Builds a catalog, requiring each of the ten ids exactly once.
    pub fn new(definitions: Vec<RuleDefinition>) -> EngineResult<Self> {
        let mut rules = BTreeMap::new();
        for definition in definitions {
            let id = definition.id;
            if rules.insert(id, definition).is_some() {
                return Err(EngineError::InvalidConfig {
                    message: format!("rule {} is defined more than once", id),
                });
            }
        }
        if let Some(missing) = RuleId::all().find(|id| !rules.contains_key(id)) {
            return Err(EngineError::InvalidConfig {
                message: format!("rule {} is not defined", missing),
            });
        }
        Ok(Self { rules })
    }

    /// Gets a rule definition.
    pub fn get(&self, id: RuleId) -> Option<&RuleDefinition> {
        self.rules.get(&id)
    }

    /// Every rule id in the catalog.
    pub fn ids(&self) -> BTreeSet<RuleId> {
        self.rules.keys().copied().collect()
    }

    /// Iterates over the definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.values()
    }
}

/// A job-title pattern.
///
/// A plain string matches when it occurs anywhere in the title; `{ exact: ... }`
/// matches only the whole title. Both ignore case and repeated whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TitlePattern {
    /// Case-insensitive substring.
    Contains(String),
    /// Case-insensitive whole-title match.
    Exact {
        /// The full title.
        exact: String,
    },
}

impl TitlePattern {
    /// Tests the pattern against a title already passed through [`normalize_title`].
    pub fn matches(&self, normalized_title: &str) -> bool {
        match self {
            TitlePattern::Contains(fragment) => normalized_title.contains(&normalize_title(fragment)),
            TitlePattern::Exact { exact } => normalized_title == normalize_title(exact),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            TitlePattern::Contains(s) | TitlePattern::Exact { exact: s } => s.trim().is_empty(),
        }
    }
}

/// Upper-cases a title and collapses runs of whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// A named group of job titles sharing a rule set and payout mode.
#[derive(Debug, Clone, Deserialize)]
pub struct Bucket {
    /// The bucket identifier.
    pub id: String,
    /// Title patterns; any match selects the bucket.
    #[serde(default)]
    pub patterns: Vec<TitlePattern>,
    /// Rules that apply to employees in this bucket.
    pub applicable_rules: BTreeSet<RuleId>,
    /// How employees in this bucket are paid.
    #[serde(default = "default_payout_mode")]
    pub payout: PayoutMode,
}

fn default_payout_mode() -> PayoutMode {
    PayoutMode::Progression
}

impl Bucket {
    /// Returns true when any pattern matches the normalized title.
    pub fn matches(&self, normalized_title: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(normalized_title))
    }
}

/// The ordered buckets of one employee category plus its default.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryBuckets {
    /// Buckets in priority order; the first match wins.
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    /// The bucket used when no pattern matches.
    pub default: Bucket,
}

/// An explicit correction of a declared category for matching titles.
#[derive(Debug, Clone, Deserialize)]
pub struct Reclassification {
    /// The declared category the override applies to.
    pub from_category: EmployeeCategory,
    /// Titles the override applies to.
    pub title_patterns: Vec<TitlePattern>,
    /// The category the employee is evaluated under instead.
    pub to_category: EmployeeCategory,
    /// Why the override exists.
    #[serde(default)]
    pub note: String,
}

/// buckets.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketCatalog {
    /// Buckets for individually paid employees.
    pub individual: CategoryBuckets,
    /// Buckets for position-dependent employees.
    pub position_dependent: CategoryBuckets,
    /// Buckets for excluded employees.
    pub excluded: CategoryBuckets,
    /// Category overrides applied before bucket matching.
    #[serde(default)]
    pub reclassifications: Vec<Reclassification>,
}

impl BucketCatalog {
    /// The buckets configured for a category.
    pub fn for_category(&self, category: EmployeeCategory) -> &CategoryBuckets {
        match category {
            EmployeeCategory::Individual => &self.individual,
            EmployeeCategory::PositionDependent => &self.position_dependent,
            EmployeeCategory::Excluded => &self.excluded,
        }
    }

    fn validate(&self) -> EngineResult<()> {
        for category in [
            EmployeeCategory::Individual,
            EmployeeCategory::PositionDependent,
            EmployeeCategory::Excluded,
        ] {
            let group = self.for_category(category);
            let mut seen = HashSet::new();
            for bucket in group.buckets.iter().chain(std::iter::once(&group.default)) {
                if !seen.insert(bucket.id.as_str()) {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "bucket '{}' appears twice in category '{}'",
                            bucket.id,
                            category.as_str()
                        ),
                    });
                }
                if bucket.patterns.iter().any(TitlePattern::is_blank) {
                    return Err(EngineError::InvalidConfig {
                        message: format!("bucket '{}' has a blank pattern", bucket.id),
                    });
                }
                if let PayoutMode::Supervisory { rate, .. } = &bucket.payout {
                    if rate.is_sign_negative() {
                        return Err(EngineError::InvalidConfig {
                            message: format!("bucket '{}' has a negative rate", bucket.id),
                        });
                    }
                }
                if let PayoutMode::Fixed { amount } = &bucket.payout {
                    if amount.is_sign_negative() {
                        return Err(EngineError::InvalidConfig {
                            message: format!("bucket '{}' has a negative amount", bucket.id),
                        });
                    }
                }
            }
            if !group.default.patterns.is_empty() {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "default bucket of category '{}' must not carry patterns",
                        category.as_str()
                    ),
                });
            }
        }
        for reclassification in &self.reclassifications {
            if reclassification.title_patterns.is_empty()
                || reclassification.title_patterns.iter().any(TitlePattern::is_blank)
            {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "reclassification from '{}' needs non-blank title patterns",
                        reclassification.from_category.as_str()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// progression.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionConfig {
    /// The highest counter value.
    pub cap: u32,
    /// Payout per counter value, index 0 through `cap`.
    pub amounts: Vec<Decimal>,
}

/// Monotonic mapping from consecutive-success months to payout.
///
/// # Example
///
/// ```
/// use incentive_engine::config::ProgressionTable;
/// use rust_decimal::Decimal;
///
/// let table = ProgressionTable::new(vec![
///     Decimal::ZERO,
///     Decimal::from(50000),
///     Decimal::from(60000),
/// ]).unwrap();
///
/// assert_eq!(table.cap(), 2);
/// assert_eq!(table.lookup(1), Decimal::from(50000));
/// assert_eq!(table.lookup(9), Decimal::from(60000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionTable {
    amounts: Vec<Decimal>,
}

impl ProgressionTable {
    /// Builds a table. Entry 0 must be zero, every later entry positive, and
    /// the sequence non-decreasing.
    pub fn new(amounts: Vec<Decimal>) -> EngineResult<Self> {
        let Some(first) = amounts.first() else {
            return Err(EngineError::InvalidConfig {
                message: "progression table is empty".to_string(),
            });
        };
        if !first.is_zero() {
            return Err(EngineError::InvalidConfig {
                message: format!("progression table entry 0 must be 0, found {}", first),
            });
        }
        for (counter, pair) in amounts.windows(2).enumerate() {
            if pair[1] <= Decimal::ZERO {
                return Err(EngineError::InvalidConfig {
                    message: format!("progression table entry {} must be positive", counter + 1),
                });
            }
            if pair[1] < pair[0] {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "progression table decreases at entry {} ({} < {})",
                        counter + 1,
                        pair[1],
                        pair[0]
                    ),
                });
            }
        }
        Ok(Self { amounts })
    }

    /// The highest counter value.
    pub fn cap(&self) -> u32 {
        (self.amounts.len() - 1) as u32
    }

    /// The payout for a counter value; values above CAP read the CAP entry.
    pub fn lookup(&self, counter: u32) -> Decimal {
        let index = counter.min(self.cap()) as usize;
        self.amounts[index]
    }

    /// All amounts, index 0 through CAP.
    pub fn amounts(&self) -> &[Decimal] {
        &self.amounts
    }
}

impl TryFrom<ProgressionConfig> for ProgressionTable {
    type Error = EngineError;

    fn try_from(config: ProgressionConfig) -> Result<Self, Self::Error> {
        if config.amounts.len() != config.cap as usize + 1 {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "progression table with cap {} needs {} amounts, found {}",
                    config.cap,
                    config.cap + 1,
                    config.amounts.len()
                ),
            });
        }
        Self::new(config.amounts)
    }
}

/// The complete incentive configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct IncentiveConfig {
    scheme: SchemeMetadata,
    reconciliation: ReconciliationSettings,
    rules: RuleCatalog,
    buckets: BucketCatalog,
    progression: ProgressionTable,
}

impl IncentiveConfig {
    /// Creates a new IncentiveConfig from its component parts, validating
    /// the bucket catalog and reconciliation settings.
    pub fn new(
        scheme: SchemeConfig,
        rules: RuleCatalog,
        buckets: BucketCatalog,
        progression: ProgressionTable,
    ) -> EngineResult<Self> {
        buckets.validate()?;
        if scheme.reconciliation.tolerance.is_sign_negative() {
            return Err(EngineError::InvalidConfig {
                message: "reconciliation tolerance must not be negative".to_string(),
            });
        }
        Ok(Self {
            scheme: scheme.scheme,
            reconciliation: scheme.reconciliation,
            rules,
            buckets,
            progression,
        })
    }

    /// Returns the scheme metadata.
    pub fn scheme(&self) -> &SchemeMetadata {
        &self.scheme
    }

    /// Returns the reconciliation settings.
    pub fn reconciliation(&self) -> &ReconciliationSettings {
        &self.reconciliation
    }

    /// Returns the rule catalog.
    pub fn rules(&self) -> &RuleCatalog {
        &self.rules
    }

    /// Returns the bucket catalog.
    pub fn buckets(&self) -> &BucketCatalog {
        &self.buckets
    }

    /// Returns the progression table.
    pub fn progression(&self) -> &ProgressionTable {
        &self.progression
    }

    /// Rounds an amount to the scheme's currency scale, toward zero.
    pub fn round_amount(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.scheme.currency_scale, RoundingStrategy::ToZero)
    }
}
