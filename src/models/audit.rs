//! Audit trail models.
//!
//! Every classification, rule check, progression transition and payout
//! decision is recorded as an [`AuditStep`]. Recoverable data problems are
//! recorded as [`AuditWarning`]s so they are never silently absorbed.

use serde::{Deserialize, Serialize};

/// The job title matched no pattern; the category default bucket was used.
pub const WARN_DEFAULT_BUCKET_FALLBACK: &str = "DEFAULT_BUCKET_FALLBACK";
/// An applicable rule had no measured value and was failed.
pub const WARN_MISSING_METRIC: &str = "MISSING_METRIC";
/// No state exists for the previous period; the counter restarted at zero.
pub const WARN_NO_PRIOR_STATE: &str = "NO_PRIOR_STATE";
/// A supervisor references an employee that is not in the batch.
pub const WARN_UNKNOWN_SUBORDINATE: &str = "UNKNOWN_SUBORDINATE";
/// A supervisor lists the same subordinate more than once; repeats are ignored.
pub const WARN_DUPLICATE_SUBORDINATE: &str = "DUPLICATE_SUBORDINATE";
/// A reclassification override changed the declared category.
pub const WARN_RECLASSIFIED: &str = "RECLASSIFIED";

/// How urgently a warning needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Likely a data-quality issue.
    Medium,
    /// Affects a payout.
    High,
}

/// A single step in the audit trace recording a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the decision that was made (e.g., "rule_3").
    pub rule_id: String,
    /// The human-readable name of the decision.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during evaluation.
///
/// # Example
///
/// ```
/// use incentive_engine::models::{AuditWarning, WarningSeverity};
///
/// let warning = AuditWarning::new(
///     "E1001",
///     "MISSING_METRIC",
///     "rule 4 has no measured value",
///     WarningSeverity::High,
/// );
/// assert_eq!(warning.employee_id.as_deref(), Some("E1001"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// The employee the warning concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level.
    pub severity: WarningSeverity,
}

impl AuditWarning {
    /// Creates a warning about a specific employee.
    pub fn new(
        employee_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            employee_id: Some(employee_id.into()),
            code: code.into(),
            message: message.into(),
            severity,
        }
    }
}

/// The complete audit trace for one employee's evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of decision steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated along the way.
    pub warnings: Vec<AuditWarning>,
    /// The total evaluation duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The number the next appended step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Returns true if any warning carries the given code.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
