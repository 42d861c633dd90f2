//! Output sink seam
//!
//! Implementations live in `nbench-report`; the engine only needs the trait.

use crate::report::{BenchmarkRunReport, TrialFault};
use crate::results::BenchmarkFinalResults;
use crate::settings::BenchmarkSettings;

/// Receives progress and results from a running benchmark
pub trait BenchmarkOutput {
    /// A benchmark is about to warm up
    fn start_benchmark(&mut self, _settings: &BenchmarkSettings) {}

    /// Called once per trial, including the warmup trial
    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool);

    /// A benchmark has delivered its final results
    fn finish_benchmark(&mut self, _settings: &BenchmarkSettings) {}

    /// Aggregated results and verdicts of one benchmark
    fn write_final_results(&mut self, results: &BenchmarkFinalResults);

    /// A trial fault, reported as it happens
    fn report_error(&mut self, benchmark: &str, fault: &TrialFault);

    /// Free-form progress line
    fn write_line(&mut self, _line: &str) {}
}

impl<T: BenchmarkOutput + ?Sized> BenchmarkOutput for &mut T {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        (**self).start_benchmark(settings)
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        (**self).write_run(report, is_warmup)
    }

    fn finish_benchmark(&mut self, settings: &BenchmarkSettings) {
        (**self).finish_benchmark(settings)
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        (**self).write_final_results(results)
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        (**self).report_error(benchmark, fault)
    }

    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

impl<T: BenchmarkOutput + ?Sized> BenchmarkOutput for Box<T> {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        (**self).start_benchmark(settings)
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        (**self).write_run(report, is_warmup)
    }

    fn finish_benchmark(&mut self, settings: &BenchmarkSettings) {
        (**self).finish_benchmark(settings)
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        (**self).write_final_results(results)
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        (**self).report_error(benchmark, fault)
    }

    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl BenchmarkOutput for NullOutput {
    fn write_run(&mut self, _: &BenchmarkRunReport, _: bool) {}

    fn write_final_results(&mut self, _: &BenchmarkFinalResults) {}

    fn report_error(&mut self, _: &str, _: &TrialFault) {}
}
