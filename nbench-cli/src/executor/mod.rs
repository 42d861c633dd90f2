//! Benchmark Executor
//!
//! Runs planned benchmarks in-process and collects their final results.
//!
//! - [`execution`] - Settings overrides and the sequential runner

mod execution;

pub use execution::{ExecutionConfig, Executor};
