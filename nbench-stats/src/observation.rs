//! Per-trial observations and their cross-run reduction

use crate::{BenchmarkStat, MIN_ELAPSED_SECONDS, NANOS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// One metric's outcome in one trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Raw delta observed during the trial
    pub value: f64,
    /// Length of the measurement window in nanoseconds
    pub elapsed_nanos: u64,
}

impl Observation {
    /// Create an observation
    pub fn new(value: f64, elapsed_nanos: u64) -> Self {
        Self {
            value,
            elapsed_nanos,
        }
    }

    /// Value normalized to one second of the measurement window
    pub fn per_second(&self) -> f64 {
        per_second(self.value, self.elapsed_nanos)
    }

    /// Nanoseconds spent per unit of the metric, 0 when nothing was counted
    pub fn nanos_per_unit(&self) -> f64 {
        if self.value == 0.0 {
            0.0
        } else {
            self.elapsed_nanos as f64 / self.value
        }
    }
}

/// Normalize `value` observed over `elapsed_nanos` to a per-second rate
pub fn per_second(value: f64, elapsed_nanos: u64) -> f64 {
    let seconds = (elapsed_nanos as f64 / NANOS_PER_SECOND).max(MIN_ELAPSED_SECONDS);
    value / seconds
}

/// Cross-run statistics for one metric
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Statistics over the raw per-trial values
    pub stats: BenchmarkStat,
    /// Statistics over the per-second normalized values
    pub per_second_stats: BenchmarkStat,
    /// Statistics over nanoseconds spent per unit of the metric
    pub nanos_per_unit_stats: BenchmarkStat,
}

/// Reduce a series of observations of a single metric
pub fn aggregate(observations: &[Observation]) -> AggregateStats {
    let raw: Vec<f64> = observations.iter().map(|o| o.value).collect();
    let per_second: Vec<f64> = observations.iter().map(Observation::per_second).collect();
    let per_unit: Vec<f64> = observations.iter().map(Observation::nanos_per_unit).collect();

    AggregateStats {
        stats: BenchmarkStat::new(&raw),
        per_second_stats: BenchmarkStat::new(&per_second),
        nanos_per_unit_stats: BenchmarkStat::new(&per_unit),
    }
}
