//! Batch evaluation of one period.
//!
//! A run classifies and evaluates every employee, advances their progression
//! counters, and then settles payouts in two phases:
//!
//! 1. every non-supervisory employee;
//! 2. every supervisor, from the phase 1 payouts of their declared subordinates.
//!
//! A supervisor whose subordinate has no phase 1 payout is a malformed
//! hierarchy. That supervisor is reported as a failure and gets no outcome;
//! the rest of the batch completes.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IncentiveConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditTrace, AuditWarning, ComputationFailure, EmployeeEvaluation, EmployeeOutcome,
    EmployeeRecord, PayoutTotals, Period, PeriodOutcome, ProgressionState,
    WARN_DUPLICATE_SUBORDINATE, WARN_UNKNOWN_SUBORDINATE, WarningSeverity,
};

use super::condition_evaluator::evaluate_employee;
use super::payout::{PayoutDecision, SubordinatePayouts, compute_payout};
use super::position_classifier::classify_employee;
use super::progression::{ProgressionStore, advance_with_audit, settle};

/// An employee between evaluation and payout.
struct Staged<'a> {
    record: &'a EmployeeRecord,
    evaluation: EmployeeEvaluation,
    state: ProgressionState,
    trace: AuditTrace,
    started: Instant,
    decision: Option<PayoutDecision>,
}

/// Classifies, evaluates, and advances one employee.
fn stage<'a>(
    record: &'a EmployeeRecord,
    period: Period,
    config: &IncentiveConfig,
    store: &ProgressionStore,
) -> Staged<'a> {
    let started = Instant::now();
    let mut trace = AuditTrace::default();

    let classification = classify_employee(record, config, trace.next_step_number());
    trace.steps.push(classification.audit_step);
    trace.warnings.extend(classification.warnings);

    let conditions = evaluate_employee(
        record,
        period,
        &classification.profile,
        config,
        trace.next_step_number(),
    );
    trace.steps.extend(conditions.audit_steps);
    trace.warnings.extend(conditions.warnings);

    let transition = advance_with_audit(
        &conditions.evaluation,
        store.prior_for(&record.employee_id, period),
        config.progression(),
        trace.next_step_number(),
    );
    trace.steps.push(transition.audit_step);
    trace.warnings.extend(transition.warning);

    debug!(
        employee_id = %record.employee_id,
        bucket = %conditions.evaluation.position_profile.resolved_bucket,
        pass_rate = %conditions.evaluation.pass_rate,
        counter = transition.state.consecutive_success_months,
        "Employee evaluated"
    );

    Staged {
        record,
        evaluation: conditions.evaluation,
        state: transition.state,
        trace,
        started,
        decision: None,
    }
}

/// Gathers the phase 1 payouts of a supervisor's active subordinates.
///
/// Each subordinate counts once; repeated ids raise a warning. Ids absent
/// from the batch contribute nothing and raise a warning. Inactive
/// subordinates are skipped. A subordinate in the batch without a phase 1
/// payout is a dependency violation.
fn collect_subordinate_payouts(
    supervisor: &EmployeeRecord,
    batch: &HashMap<&str, &EmployeeRecord>,
    finalized: &HashMap<&str, Decimal>,
) -> EngineResult<(SubordinatePayouts, Vec<AuditWarning>)> {
    let mut payouts = Vec::new();
    let mut warnings = Vec::new();
    let mut counted: HashSet<&str> = HashSet::new();

    for subordinate_id in &supervisor.subordinate_ids {
        if !counted.insert(subordinate_id.as_str()) {
            warnings.push(AuditWarning::new(
                &supervisor.employee_id,
                WARN_DUPLICATE_SUBORDINATE,
                format!(
                    "Subordinate '{}' is listed more than once; counted once",
                    subordinate_id
                ),
                WarningSeverity::Medium,
            ));
            continue;
        }
        let Some(subordinate) = batch.get(subordinate_id.as_str()) else {
            warnings.push(AuditWarning::new(
                &supervisor.employee_id,
                WARN_UNKNOWN_SUBORDINATE,
                format!(
                    "Subordinate '{}' is not in this batch; contributes 0",
                    subordinate_id
                ),
                WarningSeverity::Medium,
            ));
            continue;
        };
        if !subordinate.active {
            continue;
        }
        match finalized.get(subordinate_id.as_str()) {
            Some(payout) => payouts.push(*payout),
            None => {
                return Err(EngineError::DependencyViolation {
                    supervisor_id: supervisor.employee_id.clone(),
                    subordinate_id: subordinate_id.clone(),
                });
            }
        }
    }

    Ok((SubordinatePayouts::new(payouts), warnings))
}

fn failure(employee_id: &str, error: &EngineError) -> ComputationFailure {
    ComputationFailure {
        employee_id: employee_id.to_string(),
        code: error.code().to_string(),
        message: error.to_string(),
    }
}

/// Evaluates every employee for a period and settles their payouts.
///
/// The store is only read; commit the returned outcome with
/// [`ProgressionStore::commit`] once it is accepted.
///
/// Returns `DuplicateEmployee` if an employee id appears twice. Every other
/// problem is confined to the employee it concerns.
///
/// # Examples
///
/// ```no_run
/// use incentive_engine::calculation::{ProgressionStore, run_period};
/// use incentive_engine::config::ConfigLoader;
/// use incentive_engine::models::{EmployeeCategory, EmployeeRecord, Period};
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let mut store = ProgressionStore::new();
/// let employees = vec![EmployeeRecord {
///     employee_id: "E1".to_string(),
///     category: EmployeeCategory::Individual,
///     job_title: "QC Inspector".to_string(),
///     metrics: Default::default(),
///     subordinate_ids: vec![],
///     active: true,
/// }];
///
/// let outcome = run_period(loader.config(), Period::new(2025, 1).unwrap(), &employees, &store)?;
/// store.commit(&outcome);
/// # Ok::<(), incentive_engine::error::EngineError>(())
/// ```
pub fn run_period(
    config: &IncentiveConfig,
    period: Period,
    employees: &[EmployeeRecord],
    store: &ProgressionStore,
) -> EngineResult<PeriodOutcome> {
    let run_id = Uuid::new_v4();
    let run_started = Instant::now();

    let mut seen = HashSet::new();
    for record in employees {
        if !seen.insert(record.employee_id.as_str()) {
            return Err(EngineError::DuplicateEmployee {
                employee_id: record.employee_id.clone(),
            });
        }
    }

    info!(
        run_id = %run_id,
        period = %period,
        employees = employees.len(),
        "Starting incentive run"
    );

    let mut staged: Vec<Staged> = employees
        .iter()
        .map(|record| stage(record, period, config, store))
        .collect();

    let batch: HashMap<&str, &EmployeeRecord> = employees
        .iter()
        .map(|r| (r.employee_id.as_str(), r))
        .collect();
    let mut failures = Vec::new();

    // Phase 1: everyone not paid from subordinates.
    let mut finalized: HashMap<&str, Decimal> = HashMap::new();
    for entry in staged
        .iter_mut()
        .filter(|s| !s.evaluation.position_profile.is_supervisory())
    {
        let record = entry.record;
        match compute_payout(
            &entry.evaluation.position_profile,
            &entry.evaluation,
            &entry.state,
            None,
            config,
            entry.trace.next_step_number(),
        ) {
            Ok(decision) => {
                finalized.insert(record.employee_id.as_str(), decision.payout);
                entry.decision = Some(decision);
            }
            Err(err) => {
                warn!(run_id = %run_id, employee_id = %record.employee_id, error = %err, "Payout failed");
                failures.push(failure(&record.employee_id, &err));
            }
        }
    }

    // Phase 2: supervisors, from finalized phase 1 payouts only.
    for entry in staged
        .iter_mut()
        .filter(|s| s.evaluation.position_profile.is_supervisory())
    {
        let result = collect_subordinate_payouts(entry.record, &batch, &finalized).and_then(
            |(subordinates, warnings)| {
                for warning in &warnings {
                    warn!(run_id = %run_id, employee_id = %entry.record.employee_id, "{}", warning.message);
                }
                entry.trace.warnings.extend(warnings);
                compute_payout(
                    &entry.evaluation.position_profile,
                    &entry.evaluation,
                    &entry.state,
                    Some(&subordinates),
                    config,
                    entry.trace.next_step_number(),
                )
            },
        );
        match result {
            Ok(decision) => entry.decision = Some(decision),
            Err(err) => {
                warn!(
                    run_id = %run_id,
                    employee_id = %entry.record.employee_id,
                    error = %err,
                    "Supervisory payout aborted"
                );
                failures.push(failure(&entry.record.employee_id, &err));
            }
        }
    }

    let mut results = Vec::with_capacity(staged.len());
    let mut warnings = Vec::new();
    for entry in staged {
        warnings.extend(entry.trace.warnings.iter().cloned());
        let Some(decision) = entry.decision else {
            continue;
        };

        let mut trace = entry.trace;
        trace.steps.push(decision.audit_step);
        trace.duration_us = entry.started.elapsed().as_micros() as u64;

        results.push(EmployeeOutcome {
            employee_id: entry.record.employee_id.clone(),
            evaluation: entry.evaluation,
            progression: settle(entry.state, decision.payout),
            payout: decision.payout,
            payout_basis: decision.basis,
            audit_trace: trace,
        });
    }

    let totals = PayoutTotals::from_outcomes(&results);
    info!(
        run_id = %run_id,
        period = %period,
        evaluated = totals.evaluated,
        recipients = totals.recipients,
        total_payout = %totals.total_payout,
        failures = failures.len(),
        warnings = warnings.len(),
        duration_us = run_started.elapsed().as_micros() as u64,
        "Incentive run completed"
    );

    Ok(PeriodOutcome {
        run_id,
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        period,
        results,
        failures,
        warnings,
        totals,
    })
}
