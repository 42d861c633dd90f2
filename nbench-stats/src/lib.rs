#![warn(missing_docs)]
//! NBench Statistical Engine
//!
//! Reduces the per-trial observations of one metric into cross-run statistics:
//! - Max, min, arithmetic mean and sample standard deviation
//! - The same four values over the per-second normalized observations
//! - Degenerate-but-valid (all zero) statistics for empty input

mod observation;
mod summary;

pub use observation::{AggregateStats, Observation, aggregate, per_second};
pub use summary::BenchmarkStat;

/// Lower bound applied to elapsed seconds before dividing, so a zero-length
/// window never produces an infinite rate
pub const MIN_ELAPSED_SECONDS: f64 = f64::EPSILON;

/// Nanoseconds per second
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
