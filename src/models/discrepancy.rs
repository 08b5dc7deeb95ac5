//! Reconciliation models.
//!
//! This module contains the trusted [`ReferenceRecord`] shape, the
//! [`DiscrepancyRecord`]s produced when computed results disagree with it, and
//! the [`ReconciliationReport`] that bundles them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A record from a previously finalized payroll extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// The employee.
    pub employee_id: String,
    /// The payout the trusted source paid.
    pub expected_payout: Decimal,
    /// The counter the trusted source recorded.
    pub expected_counter: u32,
}

/// The kind of disagreement between computed and reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyKind {
    /// Computed payout exceeds the reference beyond tolerance.
    Overpayment,
    /// Computed payout falls short of the reference for an eligible employee.
    Underpayment,
    /// Counters disagree for an eligible employee.
    CounterMismatch,
    /// An employee who failed a rule still receives a payout.
    IneligibleRecipient,
}

/// One detected disagreement. `delta = actual - expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyRecord {
    /// The employee.
    pub employee_id: String,
    /// What kind of disagreement this is.
    pub kind: DiscrepancyKind,
    /// The reference value (payout or counter).
    pub expected: Decimal,
    /// The computed value (payout or counter).
    pub actual: Decimal,
    /// `actual - expected`.
    pub delta: Decimal,
}

/// Which dataset an unmatched employee appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageSide {
    /// Computed but absent from the reference.
    OnlyInComputed,
    /// In the reference but not computed.
    OnlyInReference,
}

/// An employee present in only one of the compared datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    /// The employee.
    pub employee_id: String,
    /// Where the employee was found.
    pub side: CoverageSide,
}

/// One of the two datasets being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// The engine's computed records.
    Computed,
    /// The trusted reference extract.
    Reference,
}

/// An employee id that appears more than once within one dataset.
///
/// Only the first record for the id is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    /// The repeated employee id.
    pub employee_id: String,
    /// The dataset it repeats in.
    pub dataset: Dataset,
    /// How many records carry the id.
    pub occurrences: u32,
}

/// Counts and sums over a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Employees present in both datasets.
    pub compared: u32,
    /// Number of overpayment records.
    pub overpayments: u32,
    /// Number of underpayment records.
    pub underpayments: u32,
    /// Number of counter mismatch records.
    pub counter_mismatches: u32,
    /// Number of ineligible recipient records.
    pub ineligible_recipients: u32,
    /// Sum of overpayment deltas.
    pub overpaid_total: Decimal,
    /// Sum of underpayment deltas (as a positive amount).
    pub underpaid_total: Decimal,
}

/// The result of comparing computed results with a trusted reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Disagreements for employees present in both datasets.
    pub discrepancies: Vec<DiscrepancyRecord>,
    /// Employees present in only one dataset.
    pub coverage_gaps: Vec<CoverageGap>,
    /// Ids repeated within a dataset, computed side first.
    pub duplicates: Vec<DuplicateEntry>,
    /// Aggregate figures.
    pub summary: ReconciliationSummary,
}

impl ReconciliationReport {
    /// Returns true when nothing disagrees, coverage is complete and no id repeats.
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
            && self.coverage_gaps.is_empty()
            && self.duplicates.is_empty()
    }

    /// Discrepancies of a given kind.
    pub fn of_kind(&self, kind: DiscrepancyKind) -> Vec<&DiscrepancyRecord> {
        self.discrepancies.iter().filter(|d| d.kind == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrepancy_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&DiscrepancyKind::CounterMismatch).unwrap(),
            "\"COUNTER_MISMATCH\""
        );
        let kind: DiscrepancyKind = serde_json::from_str("\"INELIGIBLE_RECIPIENT\"").unwrap();
        assert_eq!(kind, DiscrepancyKind::IneligibleRecipient);
    }

    #[test]
    fn test_default_report_is_clean() {
        assert!(ReconciliationReport::default().is_clean());
    }

    #[test]
    fn test_report_with_gap_is_not_clean() {
        let report = ReconciliationReport {
            coverage_gaps: vec![CoverageGap {
                employee_id: "E9".to_string(),
                side: CoverageSide::OnlyInReference,
            }],
            ..Default::default()
        };
        assert!(!report.is_clean());
    }

    #[test]
    fn test_report_with_duplicate_is_not_clean() {
        let report = ReconciliationReport {
            duplicates: vec![DuplicateEntry {
                employee_id: "E1".to_string(),
                dataset: Dataset::Computed,
                occurrences: 2,
            }],
            ..Default::default()
        };
        assert!(!report.is_clean());
        assert_eq!(
            serde_json::to_value(&report.duplicates[0]).unwrap()["dataset"],
            "computed"
        );
    }
}
