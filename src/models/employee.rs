//! Employee model and related types.
//!
//! This module defines the [`EmployeeRecord`] struct and [`EmployeeCategory`]
//! enum describing a worker as the ingestion stage hands them to the engine.

use serde::{Deserialize, Serialize};

use super::MetricSet;

/// The incentive scheme an employee is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeCategory {
    /// Paid from their own progression counter.
    Individual,
    /// Paid according to the bucket their job title resolves to.
    PositionDependent,
    /// Structurally ineligible; always paid zero.
    Excluded,
}

impl EmployeeCategory {
    /// The configuration key for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeCategory::Individual => "individual",
            EmployeeCategory::PositionDependent => "position_dependent",
            EmployeeCategory::Excluded => "excluded",
        }
    }
}

/// One employee's input for a single period.
///
/// # Example
///
/// ```
/// use incentive_engine::models::{EmployeeCategory, EmployeeRecord};
///
/// let record: EmployeeRecord = serde_json::from_str(r#"{
///     "employee_id": "E1001",
///     "category": "position_dependent",
///     "job_title": "Senior Group Leader - Line A",
///     "metrics": {"1": "99.1", "2": "0"},
///     "subordinate_ids": ["E2001", "E2002"]
/// }"#).unwrap();
///
/// assert_eq!(record.category, EmployeeCategory::PositionDependent);
/// assert!(record.active);
/// assert!(record.has_subordinates());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// The declared incentive category.
    pub category: EmployeeCategory,
    /// Free-text job title; may carry extra qualifiers.
    #[serde(default)]
    pub job_title: String,
    /// Measured values keyed by rule id.
    #[serde(default)]
    pub metrics: MetricSet,
    /// Employees whose payouts feed a supervisory payout.
    #[serde(default)]
    pub subordinate_ids: Vec<String>,
    /// Whether the employee counts as an active subordinate this period.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl EmployeeRecord {
    /// Returns true if the employee declares any subordinates.
    pub fn has_subordinates(&self) -> bool {
        !self.subordinate_ids.is_empty()
    }
}
