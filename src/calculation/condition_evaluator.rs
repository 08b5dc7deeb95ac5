//! Eligibility condition evaluation.
//!
//! This module evaluates the applicable subset of the ten eligibility rules
//! against an employee's measured values for a period.
//!
//! A rule with no measured value fails. Rules outside the profile's
//! applicable set are left out of the results entirely, so they never enter
//! the pass-rate denominator.

use rust_decimal::Decimal;

use crate::config::{IncentiveConfig, RuleCatalog};
use crate::models::{
    AuditStep, AuditWarning, EmployeeEvaluation, EmployeeRecord, MetricSet, Period,
    PositionProfile, RuleDefinition, RuleResult, WARN_MISSING_METRIC, WarningSeverity,
};

/// The result of evaluating an employee, including audit steps.
#[derive(Debug, Clone)]
pub struct ConditionEvaluationResult {
    /// The evaluation.
    pub evaluation: EmployeeEvaluation,
    /// One audit step per applicable rule, followed by a summary step.
    pub audit_steps: Vec<AuditStep>,
    /// One warning per missing metric.
    pub warnings: Vec<AuditWarning>,
}

/// Evaluates one rule against a measured value.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::evaluate_rule;
/// use incentive_engine::models::{Comparison, RuleCategory, RuleDefinition, RuleId};
/// use rust_decimal::Decimal;
///
/// let rule = RuleDefinition {
///     id: RuleId::new(1).unwrap(),
///     name: "attendance_rate".to_string(),
///     category: RuleCategory::Attendance,
///     comparison: Comparison::AtLeast,
///     threshold: Decimal::from(98),
/// };
///
/// assert!(evaluate_rule(&rule, Some(Decimal::from(99))).passed);
/// assert!(!evaluate_rule(&rule, None).passed);
/// ```
pub fn evaluate_rule(definition: &RuleDefinition, actual: Option<Decimal>) -> RuleResult {
    let passed = actual.is_some_and(|value| definition.comparison.holds(value, definition.threshold));
    RuleResult {
        rule_id: definition.id,
        applicable: true,
        passed,
        actual_value: actual,
        threshold_value: definition.threshold,
    }
}

/// Evaluates every applicable rule of a profile. Pure; no side effects.
pub fn evaluate(
    employee_id: &str,
    period: Period,
    profile: &PositionProfile,
    metrics: &MetricSet,
    rules: &RuleCatalog,
) -> EmployeeEvaluation {
    let results = profile
        .applicable_rule_ids
        .iter()
        .filter_map(|id| rules.get(*id))
        .map(|definition| evaluate_rule(definition, metrics.get(&definition.id).copied()))
        .collect();

    EmployeeEvaluation::new(employee_id, period, profile.clone(), results)
}

/// Evaluates an employee record and records each rule check for the audit trail.
pub fn evaluate_employee(
    record: &EmployeeRecord,
    period: Period,
    profile: &PositionProfile,
    config: &IncentiveConfig,
    first_step_number: u32,
) -> ConditionEvaluationResult {
    let evaluation = evaluate(
        &record.employee_id,
        period,
        profile,
        &record.metrics,
        config.rules(),
    );

    let mut audit_steps = Vec::with_capacity(evaluation.results.len() + 1);
    let mut warnings = Vec::new();
    let mut step_number = first_step_number;

    for result in &evaluation.results {
        let Some(definition) = config.rules().get(result.rule_id) else {
            continue;
        };

        let reasoning = match result.actual_value {
            Some(actual) => format!(
                "{} = {} {} {}: {}",
                definition.name,
                actual.normalize(),
                definition.comparison.symbol(),
                definition.threshold.normalize(),
                if result.passed { "pass" } else { "fail" }
            ),
            None => {
                warnings.push(AuditWarning::new(
                    &record.employee_id,
                    WARN_MISSING_METRIC,
                    format!(
                        "No measured value for rule {} ({}); rule failed",
                        definition.id, definition.name
                    ),
                    WarningSeverity::High,
                ));
                format!("{} has no measured value: fail", definition.name)
            }
        };

        audit_steps.push(AuditStep {
            step_number,
            rule_id: format!("rule_{}", definition.id),
            rule_name: definition.name.clone(),
            input: serde_json::json!({
                "category": definition.category,
                "comparison": definition.comparison.symbol(),
                "threshold": definition.threshold.normalize().to_string(),
                "actual": result.actual_value.map(|v| v.normalize().to_string())
            }),
            output: serde_json::json!({
                "passed": result.passed
            }),
            reasoning,
        });
        step_number += 1;
    }

    let failed: Vec<u8> = evaluation.failed_rules().iter().map(|id| id.get()).collect();
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "pass_rate".to_string(),
        rule_name: "Pass Rate".to_string(),
        input: serde_json::json!({
            "applicable": evaluation.results.len(),
            "failed_rules": failed
        }),
        output: serde_json::json!({
            "pass_rate": evaluation.pass_rate.normalize().to_string(),
            "full_pass": evaluation.is_full_pass()
        }),
        reasoning: if evaluation.results.is_empty() {
            "No applicable rules; vacuous pass at 100%".to_string()
        } else {
            format!(
                "{} of {} applicable rules passed ({}%)",
                evaluation.results.len() - failed.len(),
                evaluation.results.len(),
                evaluation.pass_rate.normalize()
            )
        },
    });

    ConditionEvaluationResult {
        evaluation,
        audit_steps,
        warnings,
    }
}
