//! Structural sinks: fan-out, in-memory capture and structured logging

use nbench_core::{
    BenchmarkFinalResults, BenchmarkOutput, BenchmarkRunReport, BenchmarkSettings, TrialFault,
};
use tracing::{debug, info, warn};

/// Forwards every call to each inner sink in order
#[derive(Default)]
pub struct CompositeOutput<'a> {
    sinks: Vec<Box<dyn BenchmarkOutput + 'a>>,
}

impl<'a> CompositeOutput<'a> {
    /// A composite with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `sink`
    pub fn with(mut self, sink: impl BenchmarkOutput + 'a) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Add an already boxed sink
    pub fn push(&mut self, sink: Box<dyn BenchmarkOutput + 'a>) {
        self.sinks.push(sink);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl BenchmarkOutput for CompositeOutput<'_> {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        for sink in &mut self.sinks {
            sink.start_benchmark(settings);
        }
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        for sink in &mut self.sinks {
            sink.write_run(report, is_warmup);
        }
    }

    fn finish_benchmark(&mut self, settings: &BenchmarkSettings) {
        for sink in &mut self.sinks {
            sink.finish_benchmark(settings);
        }
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        for sink in &mut self.sinks {
            sink.write_final_results(results);
        }
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        for sink in &mut self.sinks {
            sink.report_error(benchmark, fault);
        }
    }

    fn write_line(&mut self, line: &str) {
        for sink in &mut self.sinks {
            sink.write_line(line);
        }
    }
}

/// Keeps everything it receives; used by tests and embedders
#[derive(Debug, Default, Clone)]
pub struct CollectingOutput {
    /// Names of started benchmarks
    pub started: Vec<String>,
    /// Trial reports with their warmup flag
    pub runs: Vec<(BenchmarkRunReport, bool)>,
    /// Faults with the benchmark that raised them
    pub errors: Vec<(String, TrialFault)>,
    /// Final results in completion order
    pub final_results: Vec<BenchmarkFinalResults>,
    /// Free-form lines written
    pub lines: Vec<String>,
}

impl CollectingOutput {
    /// An empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Trials excluding warmup
    pub fn measured_runs(&self) -> impl Iterator<Item = &BenchmarkRunReport> {
        self.runs.iter().filter(|(_, warmup)| !warmup).map(|(r, _)| r)
    }
}

impl BenchmarkOutput for CollectingOutput {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        self.started.push(settings.name().to_string());
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        self.runs.push((report.clone(), is_warmup));
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        self.final_results.push(results.clone());
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        self.errors.push((benchmark.to_string(), fault.clone()));
    }

    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Emits progress and verdicts as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl BenchmarkOutput for TracingOutput {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        info!(
            benchmark = settings.name(),
            iterations = settings.iterations(),
            run_mode = ?settings.run_mode(),
            "benchmark started"
        );
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        debug!(
            benchmark = %report.benchmark,
            warmup = is_warmup,
            elapsed_ns = report.elapsed_nanos,
            metrics = report.metrics.len(),
            "trial finished"
        );
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        for metric in &results.results.metrics {
            info!(
                benchmark = results.benchmark(),
                metric = %metric.name,
                mean = metric.stats.mean,
                per_second = metric.per_second_stats.mean,
                unit = %metric.unit,
                "metric summary"
            );
        }
        for verdict in &results.assertion_results {
            if verdict.passed {
                info!(benchmark = results.benchmark(), "{}", verdict.message);
            } else {
                warn!(benchmark = results.benchmark(), "{}", verdict.message);
            }
        }
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        warn!(benchmark, phase = %fault.phase, "{}", fault.message);
    }

    fn write_line(&mut self, line: &str) {
        info!("{line}");
    }
}
