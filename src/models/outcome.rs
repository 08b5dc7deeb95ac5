//! Period outcome models.
//!
//! This module contains the [`PeriodOutcome`] produced by a batch run and the
//! per-employee [`EmployeeOutcome`] records it is made of.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditTrace, AuditWarning, EmployeeEvaluation, Period, ProgressionState};

/// The inputs and result of a supervisory payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisoryBreakdown {
    /// Active subordinates whose payouts were considered.
    pub active_subordinates: u32,
    /// Active subordinates with a payout above zero.
    pub receiving_subordinates: u32,
    /// Sum of the active subordinates' payouts.
    pub subordinate_total: Decimal,
    /// `receiving_subordinates / active_subordinates`, zero when none are active.
    pub receiving_ratio: Decimal,
    /// The configured supervisory rate.
    pub rate: Decimal,
    /// `subordinate_total × rate × receiving_ratio`, rounded to currency scale.
    pub amount: Decimal,
}

/// Why an employee received the payout they did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum PayoutBasis {
    /// Structurally ineligible category.
    Excluded,
    /// Progression table lookup of the employee's counter.
    Progression {
        /// The counter used for the lookup.
        counter: u32,
    },
    /// Flat cohort amount.
    Fixed {
        /// The configured amount.
        amount: Decimal,
        /// Whether the employee passed every applicable rule.
        eligible: bool,
    },
    /// Derived from subordinates' payouts.
    Supervisory {
        /// How the amount was derived.
        breakdown: SupervisoryBreakdown,
        /// True when the supervisor's own failed rules zeroed the payout.
        withheld: bool,
    },
}

/// The final, per-employee result of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeOutcome {
    /// The employee.
    pub employee_id: String,
    /// Rule results and pass rate.
    pub evaluation: EmployeeEvaluation,
    /// The state written for this period.
    pub progression: ProgressionState,
    /// The final payout.
    pub payout: Decimal,
    /// How the payout was determined.
    pub payout_basis: PayoutBasis,
    /// Every decision taken for this employee.
    pub audit_trace: AuditTrace,
}

/// An employee whose computation was aborted.
///
/// Failed employees have no outcome record and no committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationFailure {
    /// The employee whose computation failed.
    pub employee_id: String,
    /// A machine-readable error code.
    pub code: String,
    /// The error message.
    pub message: String,
}

/// Aggregate figures for a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTotals {
    /// Employees with a final outcome.
    pub evaluated: u32,
    /// Employees with a payout above zero.
    pub recipients: u32,
    /// Sum of all final payouts.
    pub total_payout: Decimal,
}

impl PayoutTotals {
    /// Sums the given outcomes.
    pub fn from_outcomes(outcomes: &[EmployeeOutcome]) -> Self {
        Self {
            evaluated: outcomes.len() as u32,
            recipients: outcomes.iter().filter(|o| o.payout > Decimal::ZERO).count() as u32,
            total_payout: outcomes.iter().map(|o| o.payout).sum(),
        }
    }
}

/// The complete result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOutcome {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the run.
    pub engine_version: String,
    /// The evaluated period.
    pub period: Period,
    /// Final outcomes, in input order.
    pub results: Vec<EmployeeOutcome>,
    /// Employees whose computation was aborted.
    pub failures: Vec<ComputationFailure>,
    /// Every warning raised during the run.
    pub warnings: Vec<AuditWarning>,
    /// Aggregate figures over `results`.
    pub totals: PayoutTotals,
}

impl PeriodOutcome {
    /// Looks up an employee's outcome.
    pub fn outcome(&self, employee_id: &str) -> Option<&EmployeeOutcome> {
        self.results.iter().find(|o| o.employee_id == employee_id)
    }

    /// Returns true when every employee produced a final outcome.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The slim records reconciliation compares.
    pub fn computed_records(&self) -> Vec<ComputedRecord> {
        self.results.iter().map(ComputedRecord::from).collect()
    }
}

/// The fields of a computed outcome that reconciliation compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedRecord {
    /// The employee.
    pub employee_id: String,
    /// The employee's pass rate.
    pub pass_rate: Decimal,
    /// The counter written for the period.
    pub consecutive_success_months: u32,
    /// The final payout.
    pub payout: Decimal,
}

impl From<&EmployeeOutcome> for ComputedRecord {
    fn from(outcome: &EmployeeOutcome) -> Self {
        Self {
            employee_id: outcome.employee_id.clone(),
            pass_rate: outcome.evaluation.pass_rate,
            consecutive_success_months: outcome.progression.consecutive_success_months,
            payout: outcome.payout,
        }
    }
}
