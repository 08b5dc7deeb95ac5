//! Progression state model.
//!
//! [`ProgressionState`] is the only entity carried from one period to the
//! next. It is written by the progression engine and nowhere else.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Period;

/// An employee's consecutive-success counter as of the end of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// The employee this state belongs to.
    pub employee_id: String,
    /// The period at whose end this state was written.
    pub period: Period,
    /// Consecutive periods with a 100% pass rate, capped at the table's CAP.
    pub consecutive_success_months: u32,
    /// The payout recorded for the period.
    pub payout_amount: Decimal,
}

impl ProgressionState {
    /// A zero-counter state, used when no usable history exists.
    pub fn fresh(employee_id: impl Into<String>, period: Period) -> Self {
        Self {
            employee_id: employee_id.into(),
            period,
            consecutive_success_months: 0,
            payout_amount: Decimal::ZERO,
        }
    }
}
