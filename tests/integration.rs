//! Integration tests for the Incentive Engine.
//!
//! This test suite covers end-to-end scenarios including:
//! - Counter progression across consecutive periods
//! - Reset, gap and cap behaviour
//! - Classification fallback and reclassification
//! - Fixed and supervisory payouts
//! - Reconciliation against a reference extract
//! - The HTTP endpoints

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use tower::ServiceExt;

use incentive_engine::api::{AppState, create_router};
use incentive_engine::calculation::{ProgressionStore, reconcile, run_period};
use incentive_engine::config::{ConfigLoader, IncentiveConfig};
use incentive_engine::models::{
    DiscrepancyKind, EmployeeCategory, EmployeeRecord, MetricSet, PayoutBasis, Period,
    PeriodOutcome, ProgressionState, ReferenceRecord, RuleId, WARN_DEFAULT_BUCKET_FALLBACK,
    WARN_NO_PRIOR_STATE, WARN_RECLASSIFIED,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn load_config() -> IncentiveConfig {
    ConfigLoader::load("./config/default")
        .expect("Failed to load config")
        .config()
        .clone()
}

fn create_router_for_test() -> Router {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    create_router(AppState::new(config))
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn month(m: u32) -> Period {
    Period::new(2025, m).unwrap()
}

/// Metrics that satisfy every rule in the catalog.
fn passing_metrics() -> MetricSet {
    [
        (1, "99.2"),
        (2, "0"),
        (3, "22"),
        (4, "22"),
        (5, "0"),
        (6, "0"),
        (7, "0"),
        (8, "0.2"),
        (9, "99.4"),
        (10, "3400"),
    ]
    .iter()
    .map(|(id, v)| (RuleId::new(*id).unwrap(), decimal(v)))
    .collect()
}

/// Metrics that fail the attendance rate rule only.
fn low_attendance_metrics() -> MetricSet {
    let mut metrics = passing_metrics();
    metrics.insert(RuleId::new(1).unwrap(), decimal("91"));
    metrics
}

fn employee(
    id: &str,
    category: EmployeeCategory,
    title: &str,
    metrics: MetricSet,
) -> EmployeeRecord {
    EmployeeRecord {
        employee_id: id.to_string(),
        category,
        job_title: title.to_string(),
        metrics,
        subordinate_ids: vec![],
        active: true,
    }
}

fn inspector(id: &str, metrics: MetricSet) -> EmployeeRecord {
    employee(id, EmployeeCategory::Individual, "QC Inspector", metrics)
}

/// Runs and commits one period, returning its outcome.
fn run_and_commit(
    config: &IncentiveConfig,
    period: Period,
    employees: &[EmployeeRecord],
    store: &mut ProgressionStore,
) -> PeriodOutcome {
    let outcome = run_period(config, period, employees, store).expect("run failed");
    store.commit(&outcome);
    outcome
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

fn assert_decimal_field(value: &Value, expected: &str) {
    let actual = value.as_str().expect("decimal serialized as string");
    assert_eq!(
        decimal(actual).normalize(),
        decimal(expected).normalize(),
        "Expected {}, got {}",
        expected,
        actual
    );
}

// =============================================================================
// SECTION 1: Counter progression across periods
// =============================================================================

#[test]
fn test_three_passing_months_climb_the_table() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![inspector("E1", passing_metrics())];

    let counters: Vec<(u32, Decimal)> = (1..=3)
        .map(|m| {
            let outcome = run_and_commit(&config, month(m), &employees, &mut store);
            let e1 = outcome.outcome("E1").unwrap();
            (e1.progression.consecutive_success_months, e1.payout)
        })
        .collect();

    assert_eq!(
        counters,
        vec![
            (1, decimal("50000")),
            (2, decimal("60000")),
            (3, decimal("70000")),
        ]
    );
}

#[test]
fn test_single_failure_resets_progress() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let months = [passing_metrics(), low_attendance_metrics(), passing_metrics()];

    let counters: Vec<u32> = months
        .into_iter()
        .enumerate()
        .map(|(i, metrics)| {
            let outcome =
                run_and_commit(&config, month(i as u32 + 1), &[inspector("E1", metrics)], &mut store);
            outcome.outcome("E1").unwrap().progression.consecutive_success_months
        })
        .collect();

    assert_eq!(counters, vec![1, 0, 1]);
}

#[test]
fn test_failing_month_pays_nothing() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    run_and_commit(&config, month(1), &[inspector("E1", passing_metrics())], &mut store);

    let outcome = run_and_commit(
        &config,
        month(2),
        &[inspector("E1", low_attendance_metrics())],
        &mut store,
    );
    let e1 = outcome.outcome("E1").unwrap();

    // One of eight inspector rules failed.
    assert_eq!(e1.evaluation.pass_rate, decimal("87.5"));
    assert_eq!(e1.payout, Decimal::ZERO);
    assert_eq!(e1.evaluation.failed_rules(), vec![RuleId::new(1).unwrap()]);
}

#[test]
fn test_counter_saturates_at_cap() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![inspector("E1", passing_metrics())];
    let mut period = month(1);
    let mut counters = Vec::new();
    let mut payouts = Vec::new();

    for _ in 0..20 {
        let outcome = run_and_commit(&config, period, &employees, &mut store);
        let e1 = outcome.outcome("E1").unwrap();
        counters.push(e1.progression.consecutive_success_months);
        payouts.push(e1.payout);
        period = period.next();
    }

    assert_eq!(counters[13], 14);
    assert!(counters[14..].iter().all(|c| *c == 15));
    assert!(payouts[14..].iter().all(|p| *p == decimal("200000")));
    assert_eq!(store.latest("E1").unwrap().period, Period::new(2026, 8).unwrap());
}

#[test]
fn test_missing_month_restarts_counter() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![inspector("E1", passing_metrics())];

    run_and_commit(&config, month(1), &employees, &mut store);
    run_and_commit(&config, month(2), &employees, &mut store);
    // March is skipped.
    let outcome = run_and_commit(&config, month(4), &employees, &mut store);
    let e1 = outcome.outcome("E1").unwrap();

    assert_eq!(e1.progression.consecutive_success_months, 1);
    assert!(e1.audit_trace.has_warning(WARN_NO_PRIOR_STATE));
}

#[test]
fn test_rerunning_a_period_is_idempotent() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![inspector("E1", passing_metrics())];

    run_and_commit(&config, month(1), &employees, &mut store);
    let first = run_and_commit(&config, month(2), &employees, &mut store);
    let second = run_and_commit(&config, month(2), &employees, &mut store);

    assert_eq!(first.computed_records(), second.computed_records());
    assert_eq!(
        store.get("E1", month(2)).unwrap().consecutive_success_months,
        2
    );
}

#[test]
fn test_excluded_employee_never_progresses() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![employee(
        "X1",
        EmployeeCategory::Excluded,
        "Contract Cleaner",
        passing_metrics(),
    )];

    for m in 1..=4 {
        let outcome = run_and_commit(&config, month(m), &employees, &mut store);
        let x1 = outcome.outcome("X1").unwrap();
        assert_eq!(x1.evaluation.pass_rate, decimal("100"));
        assert_eq!(x1.progression.consecutive_success_months, 0);
        assert_eq!(x1.payout, Decimal::ZERO);
        assert_eq!(x1.payout_basis, PayoutBasis::Excluded);
    }
}

// =============================================================================
// SECTION 2: Classification
// =============================================================================

#[test]
fn test_unmatched_title_falls_back_to_default_rules() {
    let config = load_config();
    let employees = vec![employee(
        "E5",
        EmployeeCategory::Individual,
        "Forklift Driver",
        passing_metrics(),
    )];
    let outcome = run_period(&config, month(1), &employees, &ProgressionStore::new()).unwrap();
    let e5 = outcome.outcome("E5").unwrap();

    let profile = &e5.evaluation.position_profile;
    assert_eq!(profile.resolved_bucket, "default");
    assert!(profile.default_fallback);
    let ids: Vec<u8> = profile.applicable_rule_ids.iter().map(|id| id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(e5.evaluation.results.len(), 4);
    assert!(e5.audit_trace.has_warning(WARN_DEFAULT_BUCKET_FALLBACK));
}

#[test]
fn test_qualified_title_resolves_to_bucket() {
    let config = load_config();
    let employees = vec![employee(
        "S1",
        EmployeeCategory::PositionDependent,
        "  senior group   leader - line a ",
        passing_metrics(),
    )];
    let outcome = run_period(&config, month(1), &employees, &ProgressionStore::new()).unwrap();
    let profile = &outcome.outcome("S1").unwrap().evaluation.position_profile;

    assert_eq!(profile.resolved_bucket, "line_leader");
    assert!(profile.is_supervisory());
}

#[test]
fn test_position_dependent_inspector_is_reclassified() {
    let config = load_config();
    let employees = vec![employee(
        "E7",
        EmployeeCategory::PositionDependent,
        "Inspector",
        passing_metrics(),
    )];
    let outcome = run_period(&config, month(1), &employees, &ProgressionStore::new()).unwrap();
    let e7 = outcome.outcome("E7").unwrap();
    let profile = &e7.evaluation.position_profile;

    assert_eq!(profile.employee_category, EmployeeCategory::Individual);
    assert_eq!(
        profile.reclassified_from,
        Some(EmployeeCategory::PositionDependent)
    );
    assert_eq!(profile.resolved_bucket, "inspector");
    assert!(e7.audit_trace.has_warning(WARN_RECLASSIFIED));
}

#[test]
fn test_classification_and_evaluation_are_repeatable() {
    let config = load_config();
    let employees = vec![
        inspector("E1", passing_metrics()),
        employee(
            "E2",
            EmployeeCategory::PositionDependent,
            "Assembler",
            low_attendance_metrics(),
        ),
    ];
    let store = ProgressionStore::new();

    let first = run_period(&config, month(6), &employees, &store).unwrap();
    let second = run_period(&config, month(6), &employees, &store).unwrap();

    for (a, b) in first.results.iter().zip(second.results.iter()) {
        assert_eq!(a.evaluation, b.evaluation);
        assert_eq!(a.progression, b.progression);
    }
}

// =============================================================================
// SECTION 3: Type-specific payouts
// =============================================================================

#[test]
fn test_fixed_cohort_pays_on_full_pass_only() {
    let config = load_config();
    let employees = vec![
        employee("P1", EmployeeCategory::PositionDependent, "Packer", passing_metrics()),
        employee(
            "P2",
            EmployeeCategory::PositionDependent,
            "Packer",
            low_attendance_metrics(),
        ),
        employee(
            "P3",
            EmployeeCategory::PositionDependent,
            "Packer Assistant",
            passing_metrics(),
        ),
    ];
    let outcome = run_period(&config, month(1), &employees, &ProgressionStore::new()).unwrap();

    assert_eq!(outcome.outcome("P1").unwrap().payout, decimal("60000"));
    assert_eq!(outcome.outcome("P2").unwrap().payout, Decimal::ZERO);
    // Exact patterns do not match qualified titles.
    let p3 = outcome.outcome("P3").unwrap();
    assert_eq!(p3.evaluation.position_profile.resolved_bucket, "default");
    assert_eq!(p3.payout, decimal("50000"));
}

#[test]
fn test_supervisor_aggregates_subordinate_payouts() {
    let config = load_config();
    let previous = month(2);
    let store = ProgressionStore::from_states(vec![
        // Counter 5 -> 6 pays 100000, counter 15 stays at 200000.
        ProgressionState {
            employee_id: "W1".to_string(),
            period: previous,
            consecutive_success_months: 5,
            payout_amount: decimal("90000"),
        },
        ProgressionState {
            employee_id: "W3".to_string(),
            period: previous,
            consecutive_success_months: 15,
            payout_amount: decimal("200000"),
        },
    ]);

    let mut supervisor = employee(
        "S1",
        EmployeeCategory::PositionDependent,
        "Line Leader",
        passing_metrics(),
    );
    supervisor.subordinate_ids = vec!["W1", "W2", "W3", "W4"]
        .into_iter()
        .map(String::from)
        .collect();

    let employees = vec![
        supervisor,
        employee("W1", EmployeeCategory::PositionDependent, "Operator", passing_metrics()),
        employee(
            "W2",
            EmployeeCategory::PositionDependent,
            "Operator",
            low_attendance_metrics(),
        ),
        employee("W3", EmployeeCategory::PositionDependent, "Operator", passing_metrics()),
        employee(
            "W4",
            EmployeeCategory::PositionDependent,
            "Operator",
            low_attendance_metrics(),
        ),
    ];

    let outcome = run_period(&config, month(3), &employees, &store).unwrap();
    assert!(outcome.is_complete());

    let s1 = outcome.outcome("S1").unwrap();
    // (100000 + 200000) × 0.3 × 0.5
    assert_eq!(s1.payout, decimal("45000"));
    match &s1.payout_basis {
        PayoutBasis::Supervisory { breakdown, .. } => {
            assert_eq!(breakdown.receiving_ratio, decimal("0.5"));
            assert_eq!(breakdown.subordinate_total, decimal("300000"));
        }
        other => panic!("Expected supervisory basis, got {:?}", other),
    }
}

#[test]
fn test_failing_supervisor_is_withheld() {
    let config = load_config();
    let mut supervisor = employee(
        "S1",
        EmployeeCategory::PositionDependent,
        "Supervisor",
        low_attendance_metrics(),
    );
    supervisor.subordinate_ids = vec!["W1".to_string()];
    let employees = vec![
        supervisor,
        employee("W1", EmployeeCategory::PositionDependent, "Operator", passing_metrics()),
    ];

    let outcome = run_period(&config, month(1), &employees, &ProgressionStore::new()).unwrap();
    let s1 = outcome.outcome("S1").unwrap();

    assert_eq!(s1.payout, Decimal::ZERO);
    assert!(matches!(
        s1.payout_basis,
        PayoutBasis::Supervisory { withheld: true, .. }
    ));
}

#[test]
fn test_payout_positive_only_on_full_pass() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let titles = ["QC Inspector", "Technician", "Operator", "Quality Checker", "Welder"];

    for m in 1..=3 {
        let employees: Vec<EmployeeRecord> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let metrics = if (i as u32 + m) % 3 == 0 {
                    low_attendance_metrics()
                } else {
                    passing_metrics()
                };
                let category = if i < 2 {
                    EmployeeCategory::Individual
                } else {
                    EmployeeCategory::PositionDependent
                };
                employee(&format!("E{}", i), category, title, metrics)
            })
            .collect();

        let outcome = run_and_commit(&config, month(m), &employees, &mut store);
        for result in &outcome.results {
            assert_eq!(
                result.payout > Decimal::ZERO,
                result.evaluation.is_full_pass(),
                "{} in month {}",
                result.employee_id,
                m
            );
        }
    }
}

// =============================================================================
// SECTION 4: Reconciliation
// =============================================================================

#[test]
fn test_reconcile_outcome_against_reference() {
    let config = load_config();
    let mut store = ProgressionStore::new();
    let employees = vec![
        inspector("E1", passing_metrics()),
        inspector("E2", passing_metrics()),
        inspector("E3", low_attendance_metrics()),
    ];
    run_and_commit(&config, month(1), &employees, &mut store);
    let outcome = run_and_commit(&config, month(2), &employees, &mut store);

    let reference = vec![
        ReferenceRecord {
            employee_id: "E1".to_string(),
            expected_payout: decimal("60000"),
            expected_counter: 2,
        },
        ReferenceRecord {
            employee_id: "E2".to_string(),
            expected_payout: decimal("60000"),
            expected_counter: 1,
        },
        ReferenceRecord {
            employee_id: "E9".to_string(),
            expected_payout: decimal("50000"),
            expected_counter: 1,
        },
    ];

    let report = reconcile(
        &outcome.computed_records(),
        &reference,
        config.reconciliation().tolerance,
    )
    .expect("reconciliation failed");

    assert_eq!(report.summary.compared, 2);
    let mismatches = report.of_kind(DiscrepancyKind::CounterMismatch);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].employee_id, "E2");
    assert_eq!(report.coverage_gaps.len(), 2);
    assert!(report.of_kind(DiscrepancyKind::Overpayment).is_empty());
}

// =============================================================================
// SECTION 5: HTTP endpoints
// =============================================================================

fn http_employee(id: &str, title: &str, attendance: &str) -> Value {
    json!({
        "employee_id": id,
        "category": "position_dependent",
        "job_title": title,
        "metrics": {
            "1": attendance, "2": "0", "3": "21", "4": "21",
            "5": "0", "6": "0", "7": "0", "8": "0.3"
        }
    })
}

#[tokio::test]
async fn test_http_evaluate_then_reconcile() {
    let request = json!({
        "period": "2025-07",
        "employees": [
            http_employee("W1", "Operator", "99"),
            http_employee("W2", "Operator", "90")
        ],
        "prior_states": [
            {
                "employee_id": "W1",
                "period": "2025-06",
                "consecutive_success_months": 1,
                "payout_amount": "50000"
            }
        ]
    });

    let (status, outcome) = post_json(create_router_for_test(), "/evaluate", request).await;
    assert_eq!(status, StatusCode::OK);

    let results = outcome["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["employee_id"], "W1");
    assert_eq!(results[0]["progression"]["consecutive_success_months"], 2);
    assert_decimal_field(&results[0]["payout"], "60000");
    assert_decimal_field(&results[1]["payout"], "0");
    assert_decimal_field(&outcome["totals"]["total_payout"], "60000");

    let computed: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "employee_id": r["employee_id"],
                "pass_rate": r["evaluation"]["pass_rate"],
                "consecutive_success_months": r["progression"]["consecutive_success_months"],
                "payout": r["payout"]
            })
        })
        .collect();

    let reconcile_request = json!({
        "computed": computed,
        "reference": [
            { "employee_id": "W1", "expected_payout": "50000", "expected_counter": 2 },
            { "employee_id": "W2", "expected_payout": "0", "expected_counter": 0 }
        ]
    });

    let (status, report) =
        post_json(create_router_for_test(), "/reconcile", reconcile_request).await;
    assert_eq!(status, StatusCode::OK);

    let discrepancies = report["discrepancies"].as_array().unwrap();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0]["kind"], "OVERPAYMENT");
    assert_decimal_field(&discrepancies[0]["delta"], "10000");
    assert_eq!(report["summary"]["compared"], 2);
}

#[tokio::test]
async fn test_http_dependency_violation_is_reported_not_fatal() {
    let mut leader = http_employee("S1", "Group Leader", "99");
    leader["subordinate_ids"] = json!(["S2"]);
    let mut other = http_employee("S2", "Line Leader", "99");
    other["subordinate_ids"] = json!([]);

    let request = json!({
        "period": "2025-07",
        "employees": [leader, other]
    });

    let (status, outcome) = post_json(create_router_for_test(), "/evaluate", request).await;

    assert_eq!(status, StatusCode::OK);
    let failures = outcome["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["employee_id"], "S1");
    assert_eq!(failures[0]["code"], "DEPENDENCY_VIOLATION");
    assert_eq!(outcome["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_invalid_rule_id_in_metrics_is_rejected() {
    let request = json!({
        "period": "2025-07",
        "employees": [
            { "employee_id": "E1", "category": "individual", "metrics": { "11": "1" } }
        ]
    });

    let (status, error) = post_json(create_router_for_test(), "/evaluate", request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_http_unknown_route_is_not_found() {
    let response = create_router_for_test()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/calculate")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
