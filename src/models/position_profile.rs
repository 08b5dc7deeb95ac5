//! Position profile model.
//!
//! A [`PositionProfile`] is the resolved view of an employee's job role for one
//! period: which bucket their title landed in, which rules apply, and how the
//! bucket is paid.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EmployeeCategory, RuleId};

/// How employees in a bucket are paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PayoutMode {
    /// Table lookup of the employee's own progression counter.
    Progression,
    /// A flat amount shared across the cohort, paid on a full pass.
    Fixed {
        /// The amount paid to every fully passing member.
        amount: Decimal,
    },
    /// Derived from the subordinates' already computed payouts.
    Supervisory {
        /// The share of the subordinate total paid to the supervisor.
        rate: Decimal,
        /// Withhold the payout when the supervisor fails their own rules.
        #[serde(default = "default_require_own_pass")]
        require_own_pass: bool,
    },
}

fn default_require_own_pass() -> bool {
    true
}

impl PayoutMode {
    /// Returns true for buckets paid from subordinates' payouts.
    pub fn is_supervisory(&self) -> bool {
        matches!(self, PayoutMode::Supervisory { .. })
    }
}

/// The resolved position of an employee for one period. Immutable once built.
///
/// `applicable_rule_ids` and `excluded_rule_ids` are disjoint and together
/// cover the full rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionProfile {
    /// The category the profile was resolved under (after any reclassification).
    pub employee_category: EmployeeCategory,
    /// The job title as supplied.
    pub job_title: String,
    /// The id of the bucket the title resolved to.
    pub resolved_bucket: String,
    /// Rules that apply to this position.
    pub applicable_rule_ids: BTreeSet<RuleId>,
    /// Rules that do not apply to this position.
    pub excluded_rule_ids: BTreeSet<RuleId>,
    /// How the bucket is paid.
    pub payout_mode: PayoutMode,
    /// True when no pattern matched and the category default was used.
    pub default_fallback: bool,
    /// The declared category, when a reclassification override changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclassified_from: Option<EmployeeCategory>,
}

impl PositionProfile {
    /// Returns true when the rule applies to this position.
    pub fn applies(&self, rule_id: RuleId) -> bool {
        self.applicable_rule_ids.contains(&rule_id)
    }

    /// Returns true for structurally ineligible employees.
    pub fn is_excluded(&self) -> bool {
        self.employee_category == EmployeeCategory::Excluded
    }

    /// Returns true when the position is paid from subordinates' payouts.
    pub fn is_supervisory(&self) -> bool {
        !self.is_excluded() && self.payout_mode.is_supervisory()
    }
}
