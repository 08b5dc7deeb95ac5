//! HTTP API module for the Incentive Engine.
//!
//! This module provides the REST API endpoints for evaluating a period's
//! batch and reconciling computed results against a reference extract.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{EvaluateRequest, ReconcileRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
