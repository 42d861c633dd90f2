//! Configuration errors
//!
//! Everything here is raised while a benchmark is being assembled, before any
//! trial runs. Faults raised by user code during trials are not errors; they
//! are recorded on the trial's report (see [`TrialFault`](crate::TrialFault)).

use crate::metrics::MetricKind;
use nbench_logic::{AssertionError, AssertionType};
use thiserror::Error;

/// Errors raised while building settings or a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The benchmark declares no metric, or its selectors produced no collector
    #[error("benchmark `{0}` does not track any metric")]
    NoMetrics(String),

    /// A declared metric family has no selector registered
    #[error("no collector selector registered for {0:?} metrics")]
    MissingSelector(MetricKind),

    /// Iteration count of zero
    #[error("iteration count must be at least 1")]
    ZeroIterations,

    /// Throughput mode with a zero run time
    #[error("throughput mode requires a non-zero run time")]
    ZeroRunTime,

    /// Sampling precision of zero
    #[error("sampling precision must be non-zero")]
    ZeroPrecision,

    /// An assertion failed validation
    #[error("invalid assertion on {metric}: {source}")]
    Assertion {
        /// Metric the assertion was declared on
        metric: String,
        /// Why the assertion is invalid
        #[source]
        source: AssertionError,
    },

    /// A catalog already holds a benchmark with this name
    #[error("benchmark `{0}` is already registered")]
    DuplicateBenchmark(String),

    /// The assertion type cannot be applied to the metric
    #[error("{assertion_type:?} assertions are not supported on {metric}")]
    UnsupportedAssertion {
        /// Metric the assertion was declared on
        metric: String,
        /// Requested assertion type
        assertion_type: AssertionType,
    },
}
