//! Response types for the Incentive Engine API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A `400 Bad Request` carrying the given error.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::InvalidRuleId { .. }
            | EngineError::InvalidPeriod { .. }
            | EngineError::DuplicateEmployee { .. } => StatusCode::BAD_REQUEST,
            EngineError::DependencyViolation { .. }
            | EngineError::MissingSubordinatePayouts { .. }
            | EngineError::CalculationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let details = match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => {
                Some("The engine configuration could not be used")
            }
            EngineError::DuplicateEmployee { .. } => {
                Some("Each employee may appear only once per batch")
            }
            EngineError::DependencyViolation { .. } => {
                Some("The employee hierarchy in the batch is malformed")
            }
            EngineError::CalculationError { .. } => {
                Some("Amounts in the request are out of range")
            }
            _ => None,
        };

        let api_error = match details {
            Some(details) => ApiError::with_details(error.code(), error.to_string(), details),
            None => ApiError::new(error.code(), error.to_string()),
        };

        ApiErrorResponse {
            status,
            error: api_error,
        }
    }
}
