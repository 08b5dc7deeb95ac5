//! Progression engine.
//!
//! This module owns the per-employee consecutive-success counter. Each
//! period the counter is read from the previous period's state, advanced
//! under the all-or-nothing policy, and converted to a payout through the
//! progression table:
//!
//! - pass rate 100: `c' = min(c + 1, CAP)`
//! - anything else: `c' = 0`
//!
//! Excluded employees stay pinned at zero. A missing or non-consecutive
//! prior state is a fresh start.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::config::ProgressionTable;
use crate::models::{
    AuditStep, AuditWarning, EmployeeEvaluation, Period, PeriodOutcome, ProgressionState,
    WARN_NO_PRIOR_STATE, WarningSeverity,
};

/// The result of advancing an employee's progression, including the audit step.
#[derive(Debug, Clone)]
pub struct ProgressionTransition {
    /// The state for the evaluated period.
    pub state: ProgressionState,
    /// The audit step recording the transition.
    pub audit_step: AuditStep,
    /// Set when no usable prior state existed.
    pub warning: Option<AuditWarning>,
}

/// Returns the prior state only if it belongs to the same employee and the
/// immediately preceding period.
fn usable_prior<'a>(
    evaluation: &EmployeeEvaluation,
    prior: Option<&'a ProgressionState>,
) -> Option<&'a ProgressionState> {
    prior.filter(|p| {
        p.employee_id == evaluation.employee_id && p.period == evaluation.period.previous()
    })
}

/// Advances an employee's counter by one period.
///
/// # Examples
///
/// ```no_run
/// use incentive_engine::calculation::{advance, classify, evaluate};
/// use incentive_engine::config::ConfigLoader;
/// use incentive_engine::models::{EmployeeCategory, MetricSet, Period};
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let config = loader.config();
/// let profile = classify(EmployeeCategory::Individual, "", config.buckets(), config.rules());
/// let evaluation = evaluate("E1", Period::new(2025, 1).unwrap(), &profile,
///     &MetricSet::new(), config.rules());
///
/// // Every default rule fails without metrics, so the counter stays at zero.
/// let state = advance(&evaluation, None, config.progression());
/// assert_eq!(state.consecutive_success_months, 0);
/// ```
pub fn advance(
    evaluation: &EmployeeEvaluation,
    prior: Option<&ProgressionState>,
    table: &ProgressionTable,
) -> ProgressionState {
    let previous = usable_prior(evaluation, prior)
        .map(|p| p.consecutive_success_months)
        .unwrap_or(0);

    let counter = if evaluation.position_profile.is_excluded() || !evaluation.is_full_pass() {
        0
    } else {
        previous.saturating_add(1).min(table.cap())
    };

    ProgressionState {
        employee_id: evaluation.employee_id.clone(),
        period: evaluation.period,
        consecutive_success_months: counter,
        payout_amount: table.lookup(counter),
    }
}

/// Advances an employee's counter and records the transition for the audit trail.
pub fn advance_with_audit(
    evaluation: &EmployeeEvaluation,
    prior: Option<&ProgressionState>,
    table: &ProgressionTable,
    step_number: u32,
) -> ProgressionTransition {
    let usable = usable_prior(evaluation, prior);
    let state = advance(evaluation, prior, table);
    let previous = usable.map(|p| p.consecutive_success_months).unwrap_or(0);

    let warning = usable.is_none().then(|| {
        let detail = match prior {
            Some(p) => format!(
                "latest state is for {}, not {}",
                p.period,
                evaluation.period.previous()
            ),
            None => "no history".to_string(),
        };
        AuditWarning::new(
            &evaluation.employee_id,
            WARN_NO_PRIOR_STATE,
            format!("Counter restarted from 0 ({})", detail),
            WarningSeverity::Low,
        )
    });

    let reasoning = if evaluation.position_profile.is_excluded() {
        "Excluded category: counter pinned at 0".to_string()
    } else if evaluation.is_full_pass() {
        if state.consecutive_success_months == table.cap() && previous >= table.cap() {
            format!("Full pass; counter held at cap {}", table.cap())
        } else {
            format!(
                "Full pass; counter {} -> {}",
                previous, state.consecutive_success_months
            )
        }
    } else {
        format!(
            "Pass rate {}% below 100; counter {} reset to 0",
            evaluation.pass_rate.normalize(),
            previous
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "progression".to_string(),
        rule_name: "Progression Counter".to_string(),
        input: serde_json::json!({
            "previous_counter": previous,
            "prior_period": usable.map(|p| p.period.to_string()),
            "pass_rate": evaluation.pass_rate.normalize().to_string(),
            "cap": table.cap()
        }),
        output: serde_json::json!({
            "counter": state.consecutive_success_months,
            "table_amount": state.payout_amount.normalize().to_string()
        }),
        reasoning,
    };

    ProgressionTransition {
        state,
        audit_step,
        warning,
    }
}

/// Records the payout actually settled for the period.
///
/// [`advance`] stores the table amount. Fixed and supervisory employees are
/// paid something else, and the state carried forward holds what was paid.
pub fn settle(state: ProgressionState, payout: Decimal) -> ProgressionState {
    ProgressionState {
        payout_amount: payout,
        ..state
    }
}

/// Cross-period store of progression states keyed by employee and period.
///
/// Batch runs only read from the store; [`ProgressionStore::commit`] writes a
/// finished period. Committing the same period twice replaces the earlier
/// states, so re-running a period is idempotent.
#[derive(Debug, Clone, Default)]
pub struct ProgressionStore {
    history: HashMap<String, BTreeMap<Period, ProgressionState>>,
}

impl ProgressionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from previously persisted states.
    pub fn from_states(states: impl IntoIterator<Item = ProgressionState>) -> Self {
        let mut store = Self::new();
        for state in states {
            store.insert(state);
        }
        store
    }

    fn insert(&mut self, state: ProgressionState) {
        self.history
            .entry(state.employee_id.clone())
            .or_default()
            .insert(state.period, state);
    }

    /// The state written at the end of the period before `period`, if any.
    pub fn prior_for(&self, employee_id: &str, period: Period) -> Option<&ProgressionState> {
        self.get(employee_id, period.previous())
    }

    /// The state written for a given period.
    pub fn get(&self, employee_id: &str, period: Period) -> Option<&ProgressionState> {
        self.history.get(employee_id)?.get(&period)
    }

    /// The most recent state of an employee.
    pub fn latest(&self, employee_id: &str) -> Option<&ProgressionState> {
        self.history
            .get(employee_id)?
            .last_key_value()
            .map(|(_, state)| state)
    }

    /// Writes the states of a finished period. Failed employees have no
    /// outcome and therefore nothing is written for them.
    ///
    /// Returns the number of states written.
    pub fn commit(&mut self, outcome: &PeriodOutcome) -> usize {
        for result in &outcome.results {
            self.insert(result.progression.clone());
        }
        outcome.results.len()
    }

    /// All states of a period, ordered by employee id.
    pub fn snapshot(&self, period: Period) -> Vec<ProgressionState> {
        let mut states: Vec<ProgressionState> = self
            .history
            .values()
            .filter_map(|h| h.get(&period).cloned())
            .collect();
        states.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        states
    }

    /// Number of employees with any history.
    pub fn employee_count(&self) -> usize {
        self.history.len()
    }
}
