//! Core data models for the Incentive Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod audit;
mod discrepancy;
mod employee;
mod evaluation;
mod outcome;
mod period;
mod position_profile;
mod progression_state;
mod rule;

pub use audit::{
    AuditStep, AuditTrace, AuditWarning, WARN_DEFAULT_BUCKET_FALLBACK, WARN_DUPLICATE_SUBORDINATE,
    WARN_MISSING_METRIC, WARN_NO_PRIOR_STATE, WARN_RECLASSIFIED, WARN_UNKNOWN_SUBORDINATE,
    WarningSeverity,
};
pub use discrepancy::{
    CoverageGap, CoverageSide, Dataset, DiscrepancyKind, DiscrepancyRecord, DuplicateEntry,
    ReconciliationReport, ReconciliationSummary, ReferenceRecord,
};
pub use employee::{EmployeeCategory, EmployeeRecord};
pub use evaluation::{EmployeeEvaluation, FULL_PASS_RATE, pass_rate};
pub use outcome::{
    ComputationFailure, ComputedRecord, EmployeeOutcome, PayoutBasis, PayoutTotals,
    PeriodOutcome, SupervisoryBreakdown,
};
pub use period::Period;
pub use position_profile::{PayoutMode, PositionProfile};
pub use progression_state::ProgressionState;
pub use rule::{
    Comparison, MetricSet, RULE_COUNT, RuleCategory, RuleDefinition, RuleId, RuleResult,
};
