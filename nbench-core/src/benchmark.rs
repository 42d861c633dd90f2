//! Benchmark Execution
//!
//! Drives one benchmark from warmup to final results.
//!
//! ```text
//!  Created ──► Warming ──► Iterating ──► Completed
//!                │            │
//!           one unassessed   one fresh BenchmarkRun per trial:
//!           trial, fixes     settle → setup → body → cleanup
//!           WarmupData       → report → dispose
//! ```
//!
//! Each trial body is timed in one of two ways:
//!
//! - **Fast**: iteration mode with a warmup no longer than the sampling
//!   precision. Sample, run the body once, sample again; no threads.
//! - **Background-sampled**: everything else. A work thread runs the body
//!   (in self-sizing batches until the run-time budget elapses or the
//!   benchmark is cancelled in throughput mode, once otherwise) while a sampler thread reads every bucket each sampling
//!   interval. One reading is taken before the work thread starts and one
//!   after both threads have joined.
//!
//! Errors and panics raised by user code are captured per trial as
//! [`TrialFault`]s. A faulted trial stops scheduling; the trials completed so
//! far are still compiled into results.

use crate::assertions;
use crate::builder::BenchmarkBuilder;
use crate::bucket::MeasureBucket;
use crate::context::{BenchmarkContext, CancellationToken};
use crate::error::BuildError;
use crate::invoker::{BenchmarkInvoker, InvokeResult};
use crate::measure::RunClock;
use crate::output::BenchmarkOutput;
use crate::report::{BenchmarkRunReport, FaultPhase, TrialFault};
use crate::results::{BenchmarkFinalResults, BenchmarkResults};
use crate::run::{BenchmarkRun, sample_all};
use crate::settings::{BenchmarkSettings, RunMode, TestMode};
use crate::warmup::WarmupData;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Lifecycle of a [`Benchmark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkState {
    /// Built, nothing has run yet
    Created,
    /// Running the unassessed warmup trial
    Warming,
    /// Running measured trials
    Iterating,
    /// Results compiled and reported
    Completed,
}

/// How a trial body is timed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Two synchronous readings around a single invocation
    Fast,
    /// Periodic readings from a sampler thread while a work thread runs
    Background,
}

impl SamplingStrategy {
    /// Strategy for a trial in `run_mode` given the warmup estimate
    pub fn select(run_mode: RunMode, warmup: &WarmupData, precision: Duration) -> Self {
        if run_mode.samples_synchronously(warmup, precision) {
            SamplingStrategy::Fast
        } else {
            SamplingStrategy::Background
        }
    }
}

/// What the work thread does inside a background-sampled trial
#[derive(Debug, Clone, Copy)]
enum WorkPlan {
    /// Invoke once; `guard` is only used to report overruns
    Once { guard: Duration },
    /// Invoke in batches until `budget` elapses or cancellation is requested.
    /// No batch is sized to outlast `window` or the time left in the budget.
    UntilElapsed { budget: Duration, window: Duration },
}

impl WorkPlan {
    fn execute<I: BenchmarkInvoker + ?Sized>(
        self,
        invoker: &mut I,
        context: &BenchmarkContext,
        clock: RunClock,
    ) -> InvokeResult {
        match self {
            WorkPlan::Once { .. } => invoker.invoke_run(context),
            WorkPlan::UntilElapsed { budget, window } => {
                let mut batch = 1;
                loop {
                    let started = clock.elapsed();
                    if started >= budget || context.is_cancellation_requested() {
                        return Ok(());
                    }
                    invoker.invoke_run_n(context, batch)?;
                    let finished = clock.elapsed();
                    let remaining = budget.saturating_sub(finished);
                    let spent = finished.saturating_sub(started);
                    batch = next_batch(batch, spent, window.min(remaining));
                }
            }
        }
    }
}

/// Size the next batch from the cost of the previous one.
///
/// Fits as many calls as the last measured cost allows into `window`, at
/// least one and at most twice the previous batch.
fn next_batch(previous: u64, spent: Duration, window: Duration) -> u64 {
    let per_call = (spent.as_nanos() as f64 / previous as f64).max(1.0);
    let fits = (window.as_nanos() as f64 / per_call).floor() as u64;
    fits.clamp(1, previous.saturating_mul(2))
}

/// Sets the completion flag when the work thread is done, however it exits
struct Completion<'a>(&'a AtomicBool);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Run `call`, turning a returned error or a panic into a fault
fn guarded(phase: FaultPhase, call: impl FnOnce() -> InvokeResult) -> Option<TrialFault> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(TrialFault::new(phase, e.to_string())),
        Err(payload) => Some(TrialFault::from_panic(phase, payload.as_ref())),
    }
}

/// Yield and let the previous trial's deferred work drain before the next one
fn settle(settle_time: Duration) {
    thread::yield_now();
    if !settle_time.is_zero() {
        thread::sleep(settle_time);
    }
}

/// One benchmark: settings plus the user code they measure
pub struct Benchmark<I> {
    builder: BenchmarkBuilder,
    invoker: I,
    cancellation: CancellationToken,
    state: BenchmarkState,
    warmup: WarmupData,
    pending: u32,
    reports: VecDeque<BenchmarkRunReport>,
    faulted: bool,
}

impl<I: BenchmarkInvoker> Benchmark<I> {
    /// A benchmark running `invoker` under `settings`
    pub fn new(settings: BenchmarkSettings, invoker: I) -> Self {
        let iterations = settings.iterations();
        Self {
            builder: BenchmarkBuilder::new(settings),
            invoker,
            cancellation: CancellationToken::new(),
            state: BenchmarkState::Created,
            warmup: WarmupData::PRE_WARMUP,
            pending: iterations,
            reports: VecDeque::with_capacity(iterations as usize),
            faulted: false,
        }
    }

    /// Share an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that stops this benchmark after the current trial
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Settings in use
    pub fn settings(&self) -> &BenchmarkSettings {
        self.builder.settings()
    }

    /// Current lifecycle state
    pub fn state(&self) -> BenchmarkState {
        self.state
    }

    /// Estimate in use: `PRE_WARMUP` until the warmup trial has run
    pub fn warmup(&self) -> WarmupData {
        self.warmup
    }

    /// Run warmup and every trial, then compile and report the results.
    ///
    /// Only configuration problems are returned as errors; faults in user code
    /// end up in the results.
    pub fn run(
        &mut self,
        output: &mut impl BenchmarkOutput,
    ) -> Result<BenchmarkFinalResults, BuildError> {
        self.reset();
        let _leases = self.builder.lease_resources();
        output.start_benchmark(self.builder.settings());

        self.state = BenchmarkState::Warming;
        if self.settings().skip_warmup() {
            debug!(benchmark = self.settings().name(), "warmup skipped");
        } else {
            self.run_warmup(output)?;
        }

        self.state = BenchmarkState::Iterating;
        while self.pending > 0 && !self.cancellation.is_cancelled() && !self.faulted {
            self.run_trial(output)?;
        }
        if self.cancellation.is_cancelled() {
            debug!(
                benchmark = self.settings().name(),
                remaining = self.pending,
                "cancelled"
            );
        }

        self.state = BenchmarkState::Completed;
        Ok(self.finish(output))
    }

    fn reset(&mut self) {
        self.pending = self.settings().iterations();
        self.reports.clear();
        self.faulted = false;
        self.warmup = WarmupData::PRE_WARMUP;
    }

    fn run_warmup(&mut self, output: &mut impl BenchmarkOutput) -> Result<(), BuildError> {
        let mut run = self
            .builder
            .new_run(&WarmupData::PRE_WARMUP, &self.cancellation)?;
        let report = self.execute(&mut run, SamplingStrategy::Fast);
        run.dispose();

        self.warmup = WarmupData::new(report.elapsed_nanos, 1);
        debug!(
            benchmark = self.settings().name(),
            elapsed_ns = self.warmup.elapsed_nanos(),
            runs_per_second = self.warmup.estimated_runs_per_second(),
            "warmup complete"
        );

        output.write_run(&report, true);
        self.record_faults(&report, output);
        if report.is_faulted() {
            // The warmup report is only kept to carry its fault into the results
            self.retain(report);
        }
        Ok(())
    }

    fn run_trial(&mut self, output: &mut impl BenchmarkOutput) -> Result<(), BuildError> {
        let mut run = self.builder.new_run(&self.warmup, &self.cancellation)?;
        settle(self.settings().settle_time());

        let settings = self.settings();
        let strategy =
            SamplingStrategy::select(settings.run_mode(), &self.warmup, settings.sampling_precision());
        debug!(
            benchmark = settings.name(),
            trial = settings.iterations() - self.pending + 1,
            ?strategy,
            "starting trial"
        );

        let report = self.execute(&mut run, strategy);
        run.dispose();
        self.pending -= 1;

        output.write_run(&report, false);
        self.record_faults(&report, output);
        self.retain(report);
        Ok(())
    }

    fn record_faults(&mut self, report: &BenchmarkRunReport, output: &mut impl BenchmarkOutput) {
        for fault in &report.faults {
            warn!(benchmark = %report.benchmark, %fault, "trial faulted");
            output.report_error(&report.benchmark, fault);
        }
        if report.is_faulted() {
            self.faulted = true;
        }
    }

    /// Keep at most `iterations` reports, dropping the oldest
    fn retain(&mut self, report: BenchmarkRunReport) {
        let capacity = (self.settings().iterations() as usize).max(1);
        while self.reports.len() >= capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }

    /// Setup, timed body, cleanup. A failed setup skips the body.
    fn execute(&mut self, run: &mut BenchmarkRun, strategy: SamplingStrategy) -> BenchmarkRunReport {
        let mut faults = Vec::new();
        let invoker = &mut self.invoker;

        if let Some(fault) = guarded(FaultPhase::Setup, || invoker.invoke_setup(run.context())) {
            faults.push(fault);
        }

        let mut elapsed_nanos = 0;
        if faults.is_empty() {
            let (elapsed, fault) = match strategy {
                SamplingStrategy::Fast => sample_fast(invoker, run),
                SamplingStrategy::Background => {
                    let settings = self.builder.settings();
                    let plan = match settings.run_mode() {
                        RunMode::Throughput => WorkPlan::UntilElapsed {
                            budget: settings.run_time(),
                            window: settings.sampling_precision(),
                        },
                        RunMode::Iterations => WorkPlan::Once {
                            guard: settings.run_time(),
                        },
                    };
                    sample_in_background(invoker, run, plan, settings.sampling_precision())
                }
            };
            elapsed_nanos = elapsed;
            faults.extend(fault);
        }

        if let Some(fault) = guarded(FaultPhase::Cleanup, || invoker.invoke_cleanup(run.context())) {
            faults.push(fault);
        }

        let mut report = run.to_report(elapsed_nanos);
        report.faults = faults;
        report
    }

    fn finish(&mut self, output: &mut impl BenchmarkOutput) -> BenchmarkFinalResults {
        let settings = self.builder.settings();
        let reports: Vec<_> = self.reports.drain(..).collect();
        let results = BenchmarkResults::compile(settings.name(), reports);

        let assertion_results = match settings.test_mode() {
            TestMode::Test => assertions::evaluate(settings, &results),
            TestMode::Measurement => Vec::new(),
        };
        let measured_only = settings
            .distinct_measurements()
            .into_iter()
            .map(|setting| setting.metric)
            .filter(|metric| {
                let label = metric.to_string();
                !assertion_results.iter().any(|r| r.metric == label)
            })
            .collect();
        let final_results =
            BenchmarkFinalResults::new(results, assertion_results).with_measured_only(measured_only);

        debug!(
            benchmark = settings.name(),
            runs = final_results.results.run_count(),
            passed = final_results.all_asserts_passed,
            "benchmark complete"
        );
        output.write_final_results(&final_results);
        output.finish_benchmark(settings);
        final_results
    }
}

/// Sample, invoke once, sample again
fn sample_fast<I: BenchmarkInvoker + ?Sized>(
    invoker: &mut I,
    run: &mut BenchmarkRun,
) -> (u64, Option<TrialFault>) {
    let clock = RunClock::start();
    run.sample(clock.elapsed_nanos());
    let fault = guarded(FaultPhase::Run, || invoker.invoke_run(run.context()));
    let elapsed = clock.elapsed_nanos();
    // Keeps the window non-empty for bodies faster than the clock resolution
    run.sample(elapsed + 1);
    (elapsed, fault)
}

fn sample_in_background<I: BenchmarkInvoker + ?Sized>(
    invoker: &mut I,
    run: &mut BenchmarkRun,
    plan: WorkPlan,
    precision: Duration,
) -> (u64, Option<TrialFault>) {
    let clock = RunClock::start();
    let (buckets, context) = run.split();
    sample_all(buckets, clock.elapsed_nanos());

    let done = AtomicBool::new(false);
    let (elapsed, fault) = thread::scope(|s| {
        let done = &done;
        let sampler = s.spawn(move || sample_until(buckets, clock, precision, done));
        let worker = s.spawn(move || {
            let _completion = Completion(done);
            let fault = guarded(FaultPhase::Run, || plan.execute(invoker, context, clock));
            (clock.elapsed_nanos(), fault)
        });

        let outcome = worker.join().unwrap_or_else(|payload| {
            (
                clock.elapsed_nanos(),
                Some(TrialFault::from_panic(FaultPhase::Run, payload.as_ref())),
            )
        });
        sampler.thread().unpark();
        if sampler.join().is_err() {
            warn!("sampler thread panicked, intermediate readings lost");
        }
        outcome
    });

    // Final reading once both threads are gone
    sample_all(run.split().0, clock.elapsed_nanos());

    if let WorkPlan::Once { guard } = plan {
        if Duration::from_nanos(elapsed) > guard {
            warn!(
                elapsed_ms = elapsed / 1_000_000,
                budget_ms = guard.as_millis() as u64,
                "trial exceeded its run-time budget"
            );
        }
    }
    (elapsed, fault)
}

fn sample_until(
    buckets: &mut [MeasureBucket],
    clock: RunClock,
    precision: Duration,
    done: &AtomicBool,
) {
    while !done.load(Ordering::Acquire) {
        thread::park_timeout(precision);
        if done.load(Ordering::Acquire) {
            break;
        }
        sample_all(buckets, clock.elapsed_nanos());
    }
}
