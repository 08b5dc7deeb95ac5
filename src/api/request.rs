//! Request types for the Incentive Engine API.
//!
//! This module defines the JSON request structures for the `/evaluate` and
//! `/reconcile` endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::ProgressionStore;
use crate::models::{ComputedRecord, EmployeeRecord, Period, ProgressionState, ReferenceRecord};

/// Request body for the `/evaluate` endpoint.
///
/// Contains one period's employee batch together with whatever progression
/// history the caller holds for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// The period to evaluate, as `YYYY-MM`.
    pub period: Period,
    /// The employees to evaluate, in output order.
    pub employees: Vec<EmployeeRecord>,
    /// Previously committed progression states. Only the states of the
    /// preceding period are used.
    #[serde(default)]
    pub prior_states: Vec<ProgressionState>,
}

impl EvaluateRequest {
    /// Builds a progression store from the supplied prior states.
    pub fn store(&self) -> ProgressionStore {
        ProgressionStore::from_states(self.prior_states.iter().cloned())
    }
}

/// Request body for the `/reconcile` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// Freshly computed results.
    pub computed: Vec<ComputedRecord>,
    /// The trusted reference extract.
    pub reference: Vec<ReferenceRecord>,
    /// Overrides the configured payout tolerance.
    #[serde(default)]
    pub tolerance: Option<Decimal>,
}
