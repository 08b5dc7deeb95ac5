//! Type-specific payout calculation.
//!
//! This module turns an employee's evaluation and progression state into a
//! final payout, branching on category and bucket payout mode:
//!
//! - excluded employees are always paid zero;
//! - progression buckets pay the table amount for the employee's counter;
//! - fixed buckets pay a flat cohort amount on a full pass;
//! - supervisory buckets pay a share of their subordinates' payouts.

use rust_decimal::Decimal;

use crate::config::IncentiveConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, EmployeeEvaluation, PayoutBasis, PayoutMode, PositionProfile, ProgressionState,
    SupervisoryBreakdown,
};

/// The finalized payouts of a supervisor's active subordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubordinatePayouts {
    /// One payout per active subordinate.
    pub payouts: Vec<Decimal>,
}

impl SubordinatePayouts {
    /// Wraps a list of subordinate payouts.
    pub fn new(payouts: Vec<Decimal>) -> Self {
        Self { payouts }
    }
}

/// The result of a payout calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct PayoutDecision {
    /// The final payout.
    pub payout: Decimal,
    /// How the payout was determined.
    pub basis: PayoutBasis,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Derives a supervisory payout from subordinate payouts.
///
/// `amount = total × rate × receiving / active`. With no active subordinates
/// the receiving ratio is zero and so is the amount. The amount is not
/// rounded here.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::supervisory_breakdown;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let payouts = [
///     Decimal::from(100000),
///     Decimal::ZERO,
///     Decimal::from(200000),
///     Decimal::ZERO,
/// ];
/// let breakdown = supervisory_breakdown(&payouts, Decimal::from_str("0.3").unwrap());
///
/// assert_eq!(breakdown.receiving_ratio, Decimal::from_str("0.5").unwrap());
/// assert_eq!(breakdown.amount, Decimal::from(45000));
/// ```
pub fn supervisory_breakdown(subordinate_payouts: &[Decimal], rate: Decimal) -> SupervisoryBreakdown {
    let active = subordinate_payouts.len() as u32;
    let receiving = subordinate_payouts
        .iter()
        .filter(|p| **p > Decimal::ZERO)
        .count() as u32;
    let subordinate_total: Decimal = subordinate_payouts.iter().copied().sum();

    let (receiving_ratio, amount) = if active == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let active_d = Decimal::from(active);
        let receiving_d = Decimal::from(receiving);
        (
            (receiving_d / active_d).round_dp(4).normalize(),
            subordinate_total * rate * receiving_d / active_d,
        )
    };

    SupervisoryBreakdown {
        active_subordinates: active,
        receiving_subordinates: receiving,
        subordinate_total,
        receiving_ratio,
        rate,
        amount,
    }
}

/// Computes an employee's final payout.
///
/// `subordinates` must be supplied for supervisory positions; requesting a
/// supervisory payout without them is a dependency error.
pub fn compute_payout(
    profile: &PositionProfile,
    evaluation: &EmployeeEvaluation,
    state: &ProgressionState,
    subordinates: Option<&SubordinatePayouts>,
    config: &IncentiveConfig,
    step_number: u32,
) -> EngineResult<PayoutDecision> {
    let (payout, basis, reasoning) = if profile.is_excluded() {
        (
            Decimal::ZERO,
            PayoutBasis::Excluded,
            "Excluded category is structurally ineligible".to_string(),
        )
    } else {
        match &profile.payout_mode {
            PayoutMode::Progression => (
                state.payout_amount,
                PayoutBasis::Progression {
                    counter: state.consecutive_success_months,
                },
                format!(
                    "Progression table at counter {}: {}",
                    state.consecutive_success_months,
                    state.payout_amount.normalize()
                ),
            ),
            PayoutMode::Fixed { amount } => {
                let eligible = evaluation.is_full_pass();
                let payout = if eligible { *amount } else { Decimal::ZERO };
                (
                    payout,
                    PayoutBasis::Fixed {
                        amount: *amount,
                        eligible,
                    },
                    if eligible {
                        format!("Fixed cohort amount {}", amount.normalize())
                    } else {
                        "Fixed cohort amount withheld: not every rule passed".to_string()
                    },
                )
            }
            PayoutMode::Supervisory {
                rate,
                require_own_pass,
            } => {
                let subordinates =
                    subordinates.ok_or_else(|| EngineError::MissingSubordinatePayouts {
                        employee_id: evaluation.employee_id.clone(),
                    })?;
                let mut breakdown = supervisory_breakdown(&subordinates.payouts, *rate);
                breakdown.amount = config.round_amount(breakdown.amount);
                let withheld = *require_own_pass && !evaluation.is_full_pass();
                let payout = if withheld {
                    Decimal::ZERO
                } else {
                    breakdown.amount
                };
                let reasoning = if withheld {
                    format!(
                        "Supervisory amount {} withheld: own pass rate {}%",
                        breakdown.amount.normalize(),
                        evaluation.pass_rate.normalize()
                    )
                } else {
                    format!(
                        "{} × {} × {}/{} = {}",
                        breakdown.subordinate_total.normalize(),
                        rate.normalize(),
                        breakdown.receiving_subordinates,
                        breakdown.active_subordinates,
                        breakdown.amount.normalize()
                    )
                };
                (
                    payout,
                    PayoutBasis::Supervisory {
                        breakdown,
                        withheld,
                    },
                    reasoning,
                )
            }
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "payout".to_string(),
        rule_name: "Payout Calculation".to_string(),
        input: serde_json::json!({
            "category": profile.employee_category,
            "bucket": profile.resolved_bucket,
            "pass_rate": evaluation.pass_rate.normalize().to_string(),
            "counter": state.consecutive_success_months,
            "subordinates": subordinates.map(|s| s.payouts.len())
        }),
        output: serde_json::json!({
            "payout": payout.normalize().to_string(),
            "basis": basis
        }),
        reasoning,
    };

    Ok(PayoutDecision {
        payout,
        basis,
        audit_step,
    })
}
