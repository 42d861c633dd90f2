//! Warmup Estimate
//!
//! Timing of the single unassessed execution that precedes the real trials.
//! It only decides how trials are sampled and is never reported as a result.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Elapsed time and number of runs observed during warmup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupData {
    elapsed_nanos: u64,
    samples: u64,
}

impl WarmupData {
    /// Estimate used before any warmup has run: a 1-second budget for 1 sample
    pub const PRE_WARMUP: WarmupData = WarmupData {
        elapsed_nanos: 1_000_000_000,
        samples: 1,
    };

    /// Record `samples` runs observed over `elapsed_nanos`. A zero sample count is
    /// treated as one run.
    pub fn new(elapsed_nanos: u64, samples: u64) -> Self {
        Self {
            elapsed_nanos,
            samples: samples.max(1),
        }
    }

    /// Total warmup duration in nanoseconds
    pub fn elapsed_nanos(&self) -> u64 {
        self.elapsed_nanos
    }

    /// Total warmup duration
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos)
    }

    /// Runs observed
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Average cost of one run
    pub fn nanos_per_run(&self) -> f64 {
        self.elapsed_nanos as f64 / self.samples as f64
    }

    /// `ceil(1e9 / nanos_per_run)`; a run too fast to time counts as 1 ns
    pub fn estimated_runs_per_second(&self) -> u64 {
        let per_run = self.nanos_per_run().max(1.0);
        (NANOS_PER_SECOND / per_run).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_warmup() {
        let warmup = WarmupData::PRE_WARMUP;
        assert_eq!(warmup.elapsed(), Duration::from_secs(1));
        assert_eq!(warmup.samples(), 1);
        assert_eq!(warmup.estimated_runs_per_second(), 1);
    }

    #[test]
    fn test_derived_rates() {
        // 4 runs in 10ms -> 2.5ms per run -> 400 runs/s
        let warmup = WarmupData::new(10_000_000, 4);
        assert_eq!(warmup.nanos_per_run(), 2_500_000.0);
        assert_eq!(warmup.estimated_runs_per_second(), 400);
    }

    #[test]
    fn test_runs_per_second_rounds_up() {
        // 3ns per run -> 333,333,333.33 -> 333,333,334
        let warmup = WarmupData::new(3, 1);
        assert_eq!(warmup.estimated_runs_per_second(), 333_333_334);
    }

    #[test]
    fn test_zero_elapsed_is_finite() {
        let warmup = WarmupData::new(0, 0);
        assert_eq!(warmup.samples(), 1);
        assert_eq!(warmup.estimated_runs_per_second(), 1_000_000_000);
    }
}
