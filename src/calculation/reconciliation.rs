//! Reconciliation of computed results against a trusted reference.
//!
//! For every employee present in both datasets:
//!
//! - `OVERPAYMENT` when the computed payout exceeds the reference by more than
//!   the tolerance;
//! - `UNDERPAYMENT` when it falls short by more than the tolerance and the
//!   employee passed every applicable rule;
//! - `COUNTER_MISMATCH` when the counters differ and the employee passed every
//!   applicable rule;
//! - `INELIGIBLE_RECIPIENT` when the employee failed a rule yet is paid.
//!
//! Employees found in only one dataset become coverage gaps, and ids repeated
//! within a dataset are listed as duplicates. The pass is read only and never
//! mutates either input.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    ComputedRecord, CoverageGap, CoverageSide, Dataset, DiscrepancyKind, DiscrepancyRecord,
    DuplicateEntry, FULL_PASS_RATE, ReconciliationReport, ReconciliationSummary,
    ReferenceRecord,
};

fn overflow(employee_id: &str, what: &str) -> EngineError {
    EngineError::CalculationError {
        message: format!("{} overflows for employee '{}'", what, employee_id),
    }
}

fn record(
    computed: &ComputedRecord,
    kind: DiscrepancyKind,
    expected: Decimal,
    actual: Decimal,
) -> EngineResult<DiscrepancyRecord> {
    let delta = actual
        .checked_sub(expected)
        .ok_or_else(|| overflow(&computed.employee_id, "Discrepancy delta"))?;
    Ok(DiscrepancyRecord {
        employee_id: computed.employee_id.clone(),
        kind,
        expected,
        actual,
        delta,
    })
}

/// Classifies the disagreements between one computed record and its reference.
fn compare(
    computed: &ComputedRecord,
    reference: &ReferenceRecord,
    tolerance: Decimal,
) -> EngineResult<Vec<DiscrepancyRecord>> {
    let mut found = Vec::new();
    let eligible = computed.pass_rate >= FULL_PASS_RATE;
    let payout_delta = computed
        .payout
        .checked_sub(reference.expected_payout)
        .ok_or_else(|| overflow(&computed.employee_id, "Payout delta"))?;

    if payout_delta > tolerance {
        found.push(record(
            computed,
            DiscrepancyKind::Overpayment,
            reference.expected_payout,
            computed.payout,
        )?);
    }

    if eligible && -payout_delta > tolerance {
        found.push(record(
            computed,
            DiscrepancyKind::Underpayment,
            reference.expected_payout,
            computed.payout,
        )?);
    }

    if eligible && computed.consecutive_success_months != reference.expected_counter {
        found.push(record(
            computed,
            DiscrepancyKind::CounterMismatch,
            Decimal::from(reference.expected_counter),
            Decimal::from(computed.consecutive_success_months),
        )?);
    }

    if !eligible && computed.payout > Decimal::ZERO {
        found.push(record(
            computed,
            DiscrepancyKind::IneligibleRecipient,
            Decimal::ZERO,
            computed.payout,
        )?);
    }

    Ok(found)
}

/// Lists ids carried by more than one record, in order of first appearance.
fn repeated_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    dataset: Dataset,
) -> Vec<DuplicateEntry> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut order = Vec::new();
    for id in ids {
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|id| {
            let occurrences = counts.get(id).copied().unwrap_or(0);
            (occurrences > 1).then(|| DuplicateEntry {
                employee_id: id.to_string(),
                dataset,
                occurrences,
            })
        })
        .collect()
}

/// Compares computed records against a trusted reference.
///
/// Discrepancies follow the order of `computed`. Coverage gaps list the
/// computed-only employees first, then the reference-only ones, each in input
/// order. When an employee id repeats within one dataset, its first record
/// is the one compared and the id is listed in `duplicates`.
///
/// Returns `CalculationError` if a delta or a summary total exceeds the
/// range of `Decimal`.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::reconcile;
/// use incentive_engine::models::{ComputedRecord, DiscrepancyKind, ReferenceRecord};
/// use rust_decimal::Decimal;
///
/// let computed = vec![ComputedRecord {
///     employee_id: "E1".to_string(),
///     pass_rate: Decimal::from(100),
///     consecutive_success_months: 3,
///     payout: Decimal::from(600000),
/// }];
/// let reference = vec![ReferenceRecord {
///     employee_id: "E1".to_string(),
///     expected_payout: Decimal::from(500000),
///     expected_counter: 3,
/// }];
///
/// let report = reconcile(&computed, &reference, Decimal::ONE)?;
/// assert_eq!(report.discrepancies.len(), 1);
/// assert_eq!(report.discrepancies[0].kind, DiscrepancyKind::Overpayment);
/// assert_eq!(report.discrepancies[0].delta, Decimal::from(100000));
/// # Ok::<(), incentive_engine::error::EngineError>(())
/// ```
pub fn reconcile(
    computed: &[ComputedRecord],
    reference: &[ReferenceRecord],
    tolerance: Decimal,
) -> EngineResult<ReconciliationReport> {
    let mut by_id: HashMap<&str, &ReferenceRecord> = HashMap::with_capacity(reference.len());
    for entry in reference {
        by_id.entry(entry.employee_id.as_str()).or_insert(entry);
    }

    let mut report = ReconciliationReport::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(computed.len());
    let mut compared = 0;

    for entry in computed {
        if !seen.insert(entry.employee_id.as_str()) {
            continue;
        }
        match by_id.get(entry.employee_id.as_str()) {
            Some(expected) => {
                compared += 1;
                report.discrepancies.extend(compare(entry, expected, tolerance)?);
            }
            None => report.coverage_gaps.push(CoverageGap {
                employee_id: entry.employee_id.clone(),
                side: CoverageSide::OnlyInComputed,
            }),
        }
    }

    let mut reported: HashSet<&str> = HashSet::new();
    for entry in reference {
        let id = entry.employee_id.as_str();
        if !seen.contains(id) && reported.insert(id) {
            report.coverage_gaps.push(CoverageGap {
                employee_id: entry.employee_id.clone(),
                side: CoverageSide::OnlyInReference,
            });
        }
    }

    report.duplicates = repeated_ids(
        computed.iter().map(|r| r.employee_id.as_str()),
        Dataset::Computed,
    );
    report.duplicates.extend(repeated_ids(
        reference.iter().map(|r| r.employee_id.as_str()),
        Dataset::Reference,
    ));
    report.summary = summarize(&report.discrepancies, compared)?;

    for discrepancy in &report.discrepancies {
        debug!(
            employee_id = %discrepancy.employee_id,
            kind = ?discrepancy.kind,
            expected = %discrepancy.expected,
            actual = %discrepancy.actual,
            delta = %discrepancy.delta,
            "Discrepancy detected"
        );
    }
    for duplicate in &report.duplicates {
        warn!(
            employee_id = %duplicate.employee_id,
            dataset = ?duplicate.dataset,
            occurrences = duplicate.occurrences,
            "Employee id repeated; only the first record was compared"
        );
    }
    info!(
        compared = report.summary.compared,
        discrepancies = report.discrepancies.len(),
        coverage_gaps = report.coverage_gaps.len(),
        duplicates = report.duplicates.len(),
        overpaid_total = %report.summary.overpaid_total,
        underpaid_total = %report.summary.underpaid_total,
        "Reconciliation completed"
    );

    Ok(report)
}

fn summarize(
    discrepancies: &[DiscrepancyRecord],
    compared: u32,
) -> EngineResult<ReconciliationSummary> {
    let mut summary = ReconciliationSummary {
        compared,
        ..Default::default()
    };
    for discrepancy in discrepancies {
        match discrepancy.kind {
            DiscrepancyKind::Overpayment => {
                summary.overpayments += 1;
                summary.overpaid_total = summary
                    .overpaid_total
                    .checked_add(discrepancy.delta)
                    .ok_or_else(|| overflow(&discrepancy.employee_id, "Overpaid total"))?;
            }
            DiscrepancyKind::Underpayment => {
                summary.underpayments += 1;
                summary.underpaid_total = summary
                    .underpaid_total
                    .checked_sub(discrepancy.delta)
                    .ok_or_else(|| overflow(&discrepancy.employee_id, "Underpaid total"))?;
            }
            DiscrepancyKind::CounterMismatch => summary.counter_mismatches += 1,
            DiscrepancyKind::IneligibleRecipient => summary.ineligible_recipients += 1,
        }
    }
    Ok(summary)
}
