//! Incentive Engine for factory production staff
//!
//! This crate decides, for every employee each month, whether they qualify for
//! a performance incentive and how much they receive. It resolves which rules
//! apply to a job role, evaluates them against monthly metrics, tracks a
//! consecutive-success counter that drives a payout table, and reconciles the
//! computed results against a trusted payroll extract.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
