//! Error types for the Incentive Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for the conditions that must stop a computation. Recoverable conditions
//! (unmatched job titles, missing metrics, missing history) are reported as
//! audit warnings instead and never surface here.

use thiserror::Error;

/// The main error type for the Incentive Engine.
///
/// # Example
///
/// ```
/// use incentive_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/rules.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/rules.yaml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but violates a catalog or table invariant.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// A rule identifier outside of 1..=10.
    #[error("Invalid rule id: {value}")]
    InvalidRuleId {
        /// The rejected value.
        value: i64,
    },

    /// A period string that is not a `YYYY-MM` month.
    #[error("Invalid period '{value}': expected YYYY-MM")]
    InvalidPeriod {
        /// The rejected value.
        value: String,
    },

    /// The same employee appears twice in one batch.
    #[error("Duplicate employee '{employee_id}' in batch")]
    DuplicateEmployee {
        /// The repeated employee id.
        employee_id: String,
    },

    /// A supervisor references an employee whose payout is not yet final.
    #[error(
        "Supervisor '{supervisor_id}' depends on '{subordinate_id}' whose payout has not been computed"
    )]
    DependencyViolation {
        /// The supervisor whose payout was requested.
        supervisor_id: String,
        /// The subordinate whose payout was unavailable.
        subordinate_id: String,
    },

    /// A supervisory payout was requested without any subordinate payouts.
    #[error("Supervisory payout for '{employee_id}' requested without subordinate payouts")]
    MissingSubordinatePayouts {
        /// The supervisor's employee id.
        employee_id: String,
    },

    /// An amount derived from the inputs left the range of `Decimal`.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// A stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            EngineError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            EngineError::InvalidConfig { .. } => "INVALID_CONFIG",
            EngineError::InvalidRuleId { .. } => "INVALID_RULE_ID",
            EngineError::InvalidPeriod { .. } => "INVALID_PERIOD",
            EngineError::DuplicateEmployee { .. } => "DUPLICATE_EMPLOYEE",
            EngineError::DependencyViolation { .. } => "DEPENDENCY_VIOLATION",
            EngineError::MissingSubordinatePayouts { .. } => "MISSING_SUBORDINATE_PAYOUTS",
            EngineError::CalculationError { .. } => "CALCULATION_ERROR",
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
