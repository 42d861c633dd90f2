//! Trial Reports
//!
//! Immutable snapshots extracted from a [`BenchmarkRun`](crate::BenchmarkRun)
//! once a trial has finished sampling.

use crate::metrics::MetricName;
use nbench_stats::Observation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What one bucket observed over one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRunReport {
    /// Benchmark or metric name
    pub name: MetricName,
    /// Unit label
    pub unit: String,
    /// Last reading minus first reading
    pub value: f64,
    /// Nanoseconds between the first and last reading, at least 1
    pub elapsed_nanos: u64,
}

impl MetricRunReport {
    /// Value and window as a statistics input
    pub fn observation(&self) -> Observation {
        Observation::new(self.value, self.elapsed_nanos)
    }

    /// `value` scaled to one second
    pub fn per_second(&self) -> f64 {
        self.observation().per_second()
    }

    /// Nanoseconds spent per unit of `value` (0 when nothing was counted)
    pub fn nanos_per_unit(&self) -> f64 {
        self.observation().nanos_per_unit()
    }
}

/// Stage of a trial in which user code failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPhase {
    /// Per-trial setup
    Setup,
    /// The timed body
    Run,
    /// Per-trial cleanup
    Cleanup,
}

impl fmt::Display for FaultPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPhase::Setup => write!(f, "setup"),
            FaultPhase::Run => write!(f, "run"),
            FaultPhase::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// An error returned or a panic raised by user code during a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFault {
    /// Phase that raised the fault
    pub phase: FaultPhase,
    /// Error text or panic payload
    pub message: String,
}

impl TrialFault {
    /// Fault raised in `phase`
    pub fn new(phase: FaultPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
        }
    }

    /// Build a fault from a `catch_unwind` payload
    pub fn from_panic(phase: FaultPhase, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self::new(phase, format!("panicked: {message}"))
    }
}

impl fmt::Display for TrialFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.message)
    }
}

/// Everything one trial produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRunReport {
    /// Benchmark name
    pub benchmark: String,
    /// Wall-clock duration of the trial body, in nanoseconds
    pub elapsed_nanos: u64,
    /// One entry per bucket
    pub metrics: Vec<MetricRunReport>,
    /// Faults raised during the trial, empty when it completed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<TrialFault>,
}

impl BenchmarkRunReport {
    /// Whether a fault was recorded
    pub fn is_faulted(&self) -> bool {
        !self.faults.is_empty()
    }

    /// Entry for `name`, if this trial collected it
    pub fn metric(&self, name: &MetricName) -> Option<&MetricRunReport> {
        self.metrics.iter().find(|m| &m.name == name)
    }
}
