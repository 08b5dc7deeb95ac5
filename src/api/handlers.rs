//! HTTP request handlers for the Incentive Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{reconcile, run_period};

use super::request::{EvaluateRequest, ReconcileRequest};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_handler))
        .route("/reconcile", post(reconcile_handler))
        .with_state(state)
}

/// Maps a JSON extraction failure to a `400` response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed message.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

fn json_ok<T: serde::Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Handler for POST /evaluate endpoint.
///
/// Runs one period's batch and returns the [`PeriodOutcome`](crate::models::PeriodOutcome).
/// Per-employee failures are part of a `200` response; only batch-level
/// errors such as duplicate ids are reported as errors.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing evaluation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let store = request.store();
    match run_period(
        state.config().config(),
        request.period,
        &request.employees,
        &store,
    ) {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %outcome.run_id,
                period = %outcome.period,
                employees = request.employees.len(),
                total_payout = %outcome.totals.total_payout,
                failures = outcome.failures.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Evaluation completed"
            );
            json_ok(outcome)
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Evaluation failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /reconcile endpoint.
///
/// Uses the configured tolerance unless the request overrides it.
async fn reconcile_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing reconciliation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let tolerance = request
        .tolerance
        .unwrap_or(state.config().config().reconciliation().tolerance);
    if tolerance < Decimal::ZERO {
        warn!(correlation_id = %correlation_id, tolerance = %tolerance, "Negative tolerance");
        return ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "tolerance must not be negative, got {}",
            tolerance
        )))
        .into_response();
    }

    let report = match reconcile(&request.computed, &request.reference, tolerance) {
        Ok(report) => report,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Reconciliation failed");
            return ApiErrorResponse::from(err).into_response();
        }
    };
    info!(
        correlation_id = %correlation_id,
        compared = report.summary.compared,
        discrepancies = report.discrepancies.len(),
        coverage_gaps = report.coverage_gaps.len(),
        duplicates = report.duplicates.len(),
        "Reconciliation completed"
    );
    json_ok(report)
}
