//! Eligibility rule models.
//!
//! This module defines the fixed battery of ten eligibility rules: their
//! identifiers, categories, comparison operators, and per-employee results.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The number of rules in the battery.
pub const RULE_COUNT: u8 = 10;

/// Identifier of one of the ten eligibility rules (1..=10).
///
/// # Example
///
/// ```
/// use incentive_engine::models::RuleId;
///
/// assert!(RuleId::new(3).is_ok());
/// assert!(RuleId::new(0).is_err());
/// assert!(RuleId::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RuleId(u8);

impl RuleId {
    /// Creates a rule id, rejecting values outside 1..=10.
    pub fn new(value: u8) -> EngineResult<Self> {
        if (1..=RULE_COUNT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidRuleId {
                value: i64::from(value),
            })
        }
    }

    /// Returns the numeric id.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Iterates over every rule id in ascending order.
    pub fn all() -> impl Iterator<Item = RuleId> {
        (1..=RULE_COUNT).map(RuleId)
    }
}

impl TryFrom<u8> for RuleId {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RuleId> for u8 {
    fn from(id: RuleId) -> Self {
        id.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The measured values supplied for one employee in one period, keyed by rule.
pub type MetricSet = BTreeMap<RuleId, Decimal>;

/// The family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Attendance rates, absences, and working-day floors.
    Attendance,
    /// Personal and area quality failures.
    Quality,
    /// Inspection pass rate and volume.
    InspectionVolume,
}

/// How a measured value is compared against a rule's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `actual >= threshold`
    #[serde(rename = ">=")]
    AtLeast,
    /// `actual <= threshold`
    #[serde(rename = "<=")]
    AtMost,
    /// `actual == threshold`
    #[serde(rename = "=")]
    Equal,
    /// `actual > threshold`
    #[serde(rename = ">")]
    GreaterThan,
}

impl Comparison {
    /// Returns true when `actual` satisfies this comparison against `threshold`.
    ///
    /// # Example
    ///
    /// ```
    /// use incentive_engine::models::Comparison;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(Comparison::AtLeast.holds(Decimal::from(98), Decimal::from(98)));
    /// assert!(!Comparison::GreaterThan.holds(Decimal::from(98), Decimal::from(98)));
    /// ```
    pub fn holds(&self, actual: Decimal, threshold: Decimal) -> bool {
        match self {
            Comparison::AtLeast => actual >= threshold,
            Comparison::AtMost => actual <= threshold,
            Comparison::Equal => actual == threshold,
            Comparison::GreaterThan => actual > threshold,
        }
    }

    /// The operator as written in configuration.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::AtLeast => ">=",
            Comparison::AtMost => "<=",
            Comparison::Equal => "=",
            Comparison::GreaterThan => ">",
        }
    }
}

/// A single eligibility rule. Loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// The rule id (1..=10).
    pub id: RuleId,
    /// A short machine-friendly name (e.g., "attendance_rate").
    pub name: String,
    /// The rule family.
    pub category: RuleCategory,
    /// The comparison applied to the measured value.
    pub comparison: Comparison,
    /// The threshold the measured value is compared against.
    pub threshold: Decimal,
}

/// The outcome of evaluating one applicable rule for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    /// The rule that was evaluated.
    pub rule_id: RuleId,
    /// Whether the rule applied to the employee's position.
    pub applicable: bool,
    /// Whether the rule passed. Only meaningful when `applicable`.
    pub passed: bool,
    /// The measured value, or `None` when the metric was not supplied.
    pub actual_value: Option<Decimal>,
    /// The threshold in force at evaluation time.
    pub threshold_value: Decimal,
}
