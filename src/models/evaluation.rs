//! Employee evaluation model.
//!
//! This module contains the [`EmployeeEvaluation`] type: the per-rule results
//! for one employee in one period together with the aggregate pass rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Period, PositionProfile, RuleId, RuleResult};

/// One hundred percent.
pub const FULL_PASS_RATE: Decimal = Decimal::ONE_HUNDRED;

/// The outcome of evaluating every applicable rule for one employee.
///
/// `pass_rate = 100 × passed / applicable`; with no applicable rules the
/// employee passes vacuously at 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeEvaluation {
    /// The evaluated employee.
    pub employee_id: String,
    /// The evaluated period.
    pub period: Period,
    /// The position profile the rules were selected from.
    pub position_profile: PositionProfile,
    /// One result per applicable rule, in rule order.
    pub results: Vec<RuleResult>,
    /// Percentage of applicable rules passed.
    pub pass_rate: Decimal,
}

impl EmployeeEvaluation {
    /// Builds an evaluation and derives its pass rate from the results.
    pub fn new(
        employee_id: impl Into<String>,
        period: Period,
        position_profile: PositionProfile,
        results: Vec<RuleResult>,
    ) -> Self {
        let pass_rate = pass_rate(&results);
        Self {
            employee_id: employee_id.into(),
            period,
            position_profile,
            results,
            pass_rate,
        }
    }

    /// Returns true when every applicable rule passed.
    pub fn is_full_pass(&self) -> bool {
        self.pass_rate == FULL_PASS_RATE
    }

    /// The ids of the applicable rules that failed.
    pub fn failed_rules(&self) -> Vec<RuleId> {
        self.results
            .iter()
            .filter(|r| r.applicable && !r.passed)
            .map(|r| r.rule_id)
            .collect()
    }
}

/// Computes `100 × passed / applicable`, or 100 when nothing applies.
///
/// Rounded to two decimal places; with at most ten rules only an all-pass
/// result can round to exactly 100.
pub fn pass_rate(results: &[RuleResult]) -> Decimal {
    let applicable = results.iter().filter(|r| r.applicable).count();
    if applicable == 0 {
        return FULL_PASS_RATE;
    }
    let passed = results.iter().filter(|r| r.applicable && r.passed).count();
    (FULL_PASS_RATE * Decimal::from(passed) / Decimal::from(applicable)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn result(id: u8, passed: bool) -> RuleResult {
        RuleResult {
            rule_id: RuleId::new(id).unwrap(),
            applicable: true,
            passed,
            actual_value: Some(Decimal::ONE),
            threshold_value: Decimal::ONE,
        }
    }

    #[test]
    fn test_pass_rate_all_passed() {
        let results = vec![result(1, true), result(2, true), result(3, true)];
        assert_eq!(pass_rate(&results), FULL_PASS_RATE);
    }

    #[test]
    fn test_pass_rate_partial() {
        let results = vec![result(1, true), result(2, false), result(3, true), result(4, false)];
        assert_eq!(pass_rate(&results), dec("50"));
    }

    #[test]
    fn test_pass_rate_thirds_is_rounded() {
        let results = vec![result(1, true), result(2, true), result(3, false)];
        assert_eq!(pass_rate(&results), dec("66.67"));
    }

    #[test]
    fn test_pass_rate_nine_of_ten_is_not_full() {
        let mut results: Vec<RuleResult> = (1..=9).map(|id| result(id, true)).collect();
        results.push(result(10, false));
        assert_eq!(pass_rate(&results), dec("90"));
    }

    #[test]
    fn test_pass_rate_vacuous_is_full() {
        assert_eq!(pass_rate(&[]), FULL_PASS_RATE);
    }

    #[test]
    fn test_pass_rate_ignores_non_applicable_entries() {
        let mut skipped = result(5, false);
        skipped.applicable = false;
        let results = vec![result(1, true), skipped];
        assert_eq!(pass_rate(&results), FULL_PASS_RATE);
    }
}
