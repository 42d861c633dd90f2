#![warn(missing_docs)]
//! NBench Core - Measurement Engine
//!
//! This crate runs benchmarks and turns their trials into results:
//! - Pluggable metric collectors and the selectors that create them per trial
//! - Warmup-driven choice between fast and background-sampled timing
//! - Per-trial fault capture and cooperative cancellation
//! - Cross-run aggregation and assertion evaluation
//! - Global allocator interceptor for allocation metrics
//!
//! ```text
//! BenchmarkSettings ──► BenchmarkBuilder ──► BenchmarkRun (per trial)
//!                                               │ sampled by Benchmark
//!                                               ▼
//!                     BenchmarkRunReport ──► BenchmarkResults ──► BenchmarkFinalResults
//! ```

mod allocator;
mod assertions;
mod benchmark;
mod bucket;
mod builder;
mod catalog;
mod collectors;
mod context;
mod error;
mod invoker;
mod measure;
mod metrics;
mod output;
mod report;
mod results;
mod run;
mod selectors;
mod settings;
mod warmup;

pub use allocator::{
    MEDIUM_ALLOCATION_LIMIT, SMALL_ALLOCATION_LIMIT, TrackingAllocator, allocation_totals,
    allocations_in, tracking_installed,
};
pub use assertions::evaluate as evaluate_assertions;
pub use benchmark::{Benchmark, BenchmarkState, SamplingStrategy};
pub use bucket::{MeasureBucket, Sample};
pub use builder::BenchmarkBuilder;
pub use catalog::{BenchmarkCatalog, CatalogEntry};
pub use collectors::{
    AllocationCountCollector, Collector, CounterCollector, CpuCyclesCollector,
    ElapsedTimeCollector, MetricCollector, ProcfsIoCollector, ProcfsIoPool, SizeClassCollector,
    TotalBytesCollector, UsageCollector, UsageScope,
};
pub use context::{BenchmarkContext, CancellationToken, Counter};
pub use error::BuildError;
pub use invoker::{BenchmarkInvoker, BenchmarkMethods, InvokeResult};
/// Whether this platform provides hardware cycle counters (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
/// When `false`, `CpuCycles` degrades to an empty collector.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::RunClock;
pub use metrics::{MemoryMetric, MetricKind, MetricName, ProcessMetric, SizeClass, TimingMetric};
pub use output::{BenchmarkOutput, NullOutput};
pub use report::{BenchmarkRunReport, FaultPhase, MetricRunReport, TrialFault};
pub use results::{AggregateMetrics, BenchmarkFinalResults, BenchmarkResults};
pub use run::BenchmarkRun;
pub use selectors::{
    AllocationSelector, CounterSelector, MemorySelector, MetricsCollectorSelector,
    ProcessSelector, ResourceLease, SelectorRegistry, TimingSelector,
};
pub use settings::{
    BenchmarkSettings, BenchmarkSettingsBuilder, DEFAULT_ITERATIONS, DEFAULT_RUN_TIME,
    DEFAULT_SAMPLING_PRECISION, MeasurementSetting, RunMode, TestMode,
};
pub use warmup::WarmupData;

pub use nbench_logic::{Assertion, AssertionResult, AssertionType, Condition, ConditionKind};
pub use nbench_stats::BenchmarkStat;
