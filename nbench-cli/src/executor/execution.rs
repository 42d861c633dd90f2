//! Benchmark Execution
//!
//! Runs planned catalog entries one after another in this process. Each entry
//! gets fresh user code from its factory and settings with the run-wide
//! overrides applied.
//!
//! ## Data Flow
//!
//! ```text
//! CatalogEntry (registered settings + factory)
//!        │
//!        ▼
//!   ExecutionConfig ── overrides ──► BenchmarkSettings
//!        │
//!        ▼
//! ┌──────────────────┐
//! │    Executor      │  Warmup → Trials → Aggregation → Assertions
//! └────────┬─────────┘
//!          │
//!          ▼
//!  BenchmarkFinalResults (one per entry)
//! ```

use crate::config::{NBenchConfig, RunnerConfig};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use nbench_core::{
    BenchmarkFinalResults, BenchmarkOutput, BenchmarkSettings, BuildError, CancellationToken,
    CatalogEntry,
};
use std::time::{Duration, Instant};
use tracing::info;

/// Run-wide overrides of per-benchmark settings.
///
/// Unset fields keep what each benchmark was registered with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionConfig {
    /// Background sampling period
    pub sampling_precision: Option<Duration>,
    /// Pause between trials
    pub settle_time: Option<Duration>,
    /// Skip the warmup trial
    pub skip_warmup: Option<bool>,
    /// Number of measured trials
    pub iterations: Option<u32>,
    /// Per-trial budget in throughput mode
    pub run_time: Option<Duration>,
}

impl ExecutionConfig {
    /// Overrides from the `[runner]` section of nbench.toml
    pub fn from_runner(runner: &RunnerConfig) -> anyhow::Result<Self> {
        let parse = |field: &str, value: &Option<String>| -> anyhow::Result<Option<Duration>> {
            value
                .as_deref()
                .map(NBenchConfig::parse_duration)
                .transpose()
                .with_context(|| format!("invalid runner.{field}"))
        };

        Ok(Self {
            sampling_precision: parse("precision", &runner.precision)?,
            settle_time: parse("settle_time", &runner.settle_time)?,
            skip_warmup: runner.skip_warmup,
            iterations: runner.iterations,
            run_time: parse("run_time", &runner.run_time)?,
        })
    }

    /// Whether no override is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge these overrides into a benchmark's registered settings.
    ///
    /// The result is validated again, so an override such as zero iterations
    /// is rejected the same way as at registration.
    pub fn resolve_for_benchmark(
        &self,
        settings: &BenchmarkSettings,
    ) -> Result<BenchmarkSettings, BuildError> {
        if self.is_empty() {
            return Ok(settings.clone());
        }

        let mut builder = settings.to_builder();
        if let Some(precision) = self.sampling_precision {
            builder = builder.sampling_precision(precision);
        }
        if let Some(settle_time) = self.settle_time {
            builder = builder.settle_time(settle_time);
        }
        if let Some(skip) = self.skip_warmup {
            builder = builder.skip_warmup(skip);
        }
        if let Some(iterations) = self.iterations {
            builder = builder.iterations(iterations);
        }
        if let Some(run_time) = self.run_time {
            builder = builder.run_time(run_time);
        }
        builder.build()
    }
}

/// Execute benchmarks and produce results (in-process mode)
pub struct Executor {
    config: ExecutionConfig,
    progress: bool,
    cancellation: CancellationToken,
}

impl Executor {
    /// Executor applying `config` to every benchmark it runs
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            progress: false,
            cancellation: CancellationToken::new(),
        }
    }

    /// Draw a progress bar on stderr
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Share a cancellation token with every benchmark this executor runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that stops the run after the current trial
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Execute all provided benchmarks.
    ///
    /// Faults in user code are part of the returned results. Only invalid
    /// configuration aborts the run.
    pub fn execute(
        &self,
        benchmarks: &[&CatalogEntry],
        output: &mut impl BenchmarkOutput,
    ) -> anyhow::Result<Vec<BenchmarkFinalResults>> {
        let pb = if self.progress {
            let pb = ProgressBar::new(benchmarks.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut results = Vec::with_capacity(benchmarks.len());
        for entry in benchmarks {
            if self.cancellation.is_cancelled() {
                info!(remaining = benchmarks.len() - results.len(), "run cancelled");
                break;
            }
            pb.set_message(entry.name().to_string());
            results.push(self.execute_single(entry, output)?);
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        Ok(results)
    }

    /// Execute a single benchmark
    fn execute_single(
        &self,
        entry: &CatalogEntry,
        output: &mut impl BenchmarkOutput,
    ) -> anyhow::Result<BenchmarkFinalResults> {
        let start = Instant::now();
        let settings = self
            .config
            .resolve_for_benchmark(entry.settings())
            .with_context(|| format!("invalid overrides for benchmark `{}`", entry.name()))?;

        let mut benchmark = entry
            .instantiate_with(settings)
            .with_cancellation(self.cancellation.clone());
        let results = benchmark
            .run(output)
            .with_context(|| format!("benchmark `{}` could not run", entry.name()))?;

        info!(
            benchmark = entry.name(),
            runs = results.results.run_count(),
            passed = results.all_asserts_passed,
            duration_ms = start.elapsed().as_millis() as u64,
            "benchmark finished"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbench_core::{
        Assertion, BenchmarkCatalog, BenchmarkMethods, BenchmarkSettings, NullOutput, RunMode,
        SelectorRegistry,
    };

    fn counting_catalog() -> BenchmarkCatalog {
        let mut catalog = BenchmarkCatalog::new();
        catalog
            .register(
                "count",
                |b| b.counter_total("ops", Assertion::greater_than(0.0)),
                || {
                    BenchmarkMethods::new(|ctx| {
                        if let Some(counter) = ctx.counter("ops") {
                            counter.increment();
                        }
                    })
                },
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_from_runner_parses_durations() {
        let runner = RunnerConfig {
            precision: Some("5ms".to_string()),
            settle_time: None,
            skip_warmup: Some(true),
            iterations: Some(3),
            run_time: Some("250ms".to_string()),
        };
        let config = ExecutionConfig::from_runner(&runner).unwrap();
        assert_eq!(config.sampling_precision, Some(Duration::from_millis(5)));
        assert_eq!(config.settle_time, None);
        assert_eq!(config.skip_warmup, Some(true));
        assert_eq!(config.iterations, Some(3));
        assert_eq!(config.run_time, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_from_runner_rejects_bad_duration() {
        let runner = RunnerConfig {
            precision: Some("soon".to_string()),
            ..RunnerConfig::default()
        };
        let err = ExecutionConfig::from_runner(&runner).unwrap_err();
        assert!(err.to_string().contains("runner.precision"));
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let settings = BenchmarkSettings::builder("b")
            .run_mode(RunMode::Throughput)
            .counter("ops")
            .build()
            .unwrap();
        let config = ExecutionConfig {
            iterations: Some(4),
            run_time: Some(Duration::from_millis(20)),
            skip_warmup: Some(true),
            ..ExecutionConfig::default()
        };

        let resolved = config.resolve_for_benchmark(&settings).unwrap();
        assert_eq!(resolved.iterations(), 4);
        assert_eq!(resolved.run_time(), Duration::from_millis(20));
        assert!(resolved.skip_warmup());
        assert_eq!(resolved.run_mode(), RunMode::Throughput);
        assert_eq!(resolved.measurements(), settings.measurements());
    }

    #[test]
    fn test_resolve_keeps_custom_selectors() {
        let settings = BenchmarkSettings::builder("b")
            .selectors(SelectorRegistry::new())
            .counter("ops")
            .build()
            .unwrap();
        let config = ExecutionConfig {
            sampling_precision: Some(Duration::from_millis(1)),
            ..ExecutionConfig::default()
        };
        let resolved = config.resolve_for_benchmark(&settings).unwrap();
        assert_eq!(resolved.sampling_precision(), Duration::from_millis(1));
        assert!(!resolved.selectors().contains(nbench_core::MetricKind::Timing));
    }

    #[test]
    fn test_resolve_rejects_zero_iterations() {
        let settings = BenchmarkSettings::builder("b").counter("ops").build().unwrap();
        let config = ExecutionConfig {
            iterations: Some(0),
            ..ExecutionConfig::default()
        };
        assert_eq!(
            config.resolve_for_benchmark(&settings).unwrap_err(),
            BuildError::ZeroIterations
        );
    }

    #[test]
    fn test_execute_runs_each_entry() {
        let catalog = counting_catalog();
        let entries: Vec<_> = catalog.iter().collect();
        let executor = Executor::new(ExecutionConfig {
            iterations: Some(3),
            ..ExecutionConfig::default()
        });

        let results = executor.execute(&entries, &mut NullOutput).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].results.run_count(), 3);
        assert!(results[0].all_asserts_passed);
    }

    #[test]
    fn test_execute_stops_when_cancelled() {
        let catalog = counting_catalog();
        let entries: Vec<_> = catalog.iter().collect();
        let executor = Executor::new(ExecutionConfig::default());
        executor.cancellation_token().cancel();

        let results = executor.execute(&entries, &mut NullOutput).unwrap();
        assert!(results.is_empty());
    }
}
