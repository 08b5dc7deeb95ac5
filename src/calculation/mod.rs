//! Calculation logic for the Incentive Engine.
//!
//! This module contains the stages an employee passes through each period:
//! position classification, rule evaluation, progression counter updates,
//! type-specific payout calculation, and the batch runner that sequences them.
//! Reconciliation against a trusted reference lives here as well.

mod batch;
mod condition_evaluator;
mod payout;
mod position_classifier;
mod progression;
mod reconciliation;

pub use batch::run_period;
pub use condition_evaluator::{
    ConditionEvaluationResult, evaluate, evaluate_employee, evaluate_rule,
};
pub use payout::{PayoutDecision, SubordinatePayouts, compute_payout, supervisory_breakdown};
pub use position_classifier::{ClassificationResult, classify, classify_employee};
pub use progression::{
    ProgressionStore, ProgressionTransition, advance, advance_with_audit, settle,
};
pub use reconciliation::reconcile;
