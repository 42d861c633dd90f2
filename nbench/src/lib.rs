#![warn(missing_docs)]
//! # NBench
//!
//! Micro-benchmark measurement engine for Rust.
//!
//! NBench runs a unit of work (setup, body, cleanup) for a number of trials,
//! samples pluggable metric sources around each execution and reduces the
//! samples into aggregated, assertable results:
//! - **Pluggable metrics**: user counters, wall-clock time, CPU cycles,
//!   allocations by size class, page faults, context switches and disk I/O
//! - **Adaptive timing**: short bodies are sampled synchronously, long ones by
//!   a background sampler thread
//! - **Fault capture**: panics and errors in user code end the benchmark
//!   with a faulted result instead of aborting the process
//! - **Assertions**: totals or per-second rates checked against thresholds
//!
//! ## Quick Start
//!
//! ```ignore
//! use nbench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut catalog = BenchmarkCatalog::new();
//!     catalog.register(
//!         "push",
//!         |b| {
//!             b.run_mode(RunMode::Throughput)
//!                 .counter_throughput("ops", Assertion::greater_than(1_000_000.0))
//!         },
//!         || {
//!             let mut data = Vec::new();
//!             BenchmarkMethods::new(move |ctx| {
//!                 data.push(1u64);
//!                 ctx.counter("ops").map(|c| c.increment());
//!             })
//!         },
//!     )?;
//!     nbench::run(&catalog)
//! }
//! ```
//!
//! ## Allocation Metrics
//!
//! Allocation metrics need the tracking allocator installed in the benchmark binary:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: nbench::TrackingAllocator = nbench::TrackingAllocator;
//! ```

// Re-export core types
pub use nbench_core::*;

// Re-export logic types
pub use nbench_logic::{
    AssertionError, AssertionSummary, aggregate_assertions, evaluate_assertion, format_value,
};

// Re-export output sinks
pub use nbench_report::{
    CollectingOutput, CompositeOutput, HumanOutput, JsonOutput, OutputFormat, Report,
    TracingOutput,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Assertion, AssertionType, BenchmarkCatalog, BenchmarkContext, BenchmarkMethods,
        BenchmarkSettings, MemoryMetric, MetricName, ProcessMetric, RunMode, SizeClass,
        TestMode, TimingMetric,
    };
}

/// Run the NBench CLI harness over a catalog.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     nbench::run(&catalog)
/// }
/// ```
pub use nbench_cli::run;

/// Run one benchmark to completion without any output.
///
/// Returns the configuration error if the benchmark cannot be assembled;
/// faults in `invoker` are recorded on the results.
pub fn run_benchmark<I: BenchmarkInvoker>(
    settings: BenchmarkSettings,
    invoker: I,
) -> Result<BenchmarkFinalResults, BuildError> {
    Benchmark::new(settings, invoker).run(&mut NullOutput)
}
