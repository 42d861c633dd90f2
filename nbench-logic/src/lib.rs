#![warn(missing_docs)]
//! NBench Logic - Assertion Engine
//!
//! Declares the conditions a benchmark can assert on its aggregated metrics,
//! evaluates them against a single scalar, and renders the verdicts as
//! human-readable messages.

mod assertion;
mod format;
mod verification;

pub use assertion::{Assertion, AssertionError, AssertionType, Condition, ConditionKind};
pub use format::format_value;
pub use verification::{
    AssertionResult, AssertionSummary, aggregate_assertions, evaluate_assertion,
};

/// Message fragment used for measure-only assertions
pub const MEASURED_ONLY: &str = "measured only";
