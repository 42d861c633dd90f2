//! Human-readable output
//!
//! Terminal-friendly rendering of benchmark progress and results:
//! - One line per trial (warmup trials marked)
//! - Per-metric statistics, raw and per second
//! - Assertion verdicts with status icons (✓/✗)
//! - Faults as they happen

use crate::report::{BenchmarkStatus, Report, measured_only_line};
use nbench_core::{
    AggregateMetrics, BenchmarkFinalResults, BenchmarkOutput, BenchmarkRunReport,
    BenchmarkSettings, TrialFault,
};
use nbench_logic::format_value;
use std::io::Write;

/// Render the statistics and verdicts of one benchmark
pub fn format_final_results(results: &BenchmarkFinalResults) -> String {
    let mut output = String::new();

    let status_icon = if results.is_faulted() {
        "💥"
    } else if results.all_asserts_passed {
        "✓"
    } else {
        "✗"
    };
    output.push_str(&format!(
        "  {} {} ({} runs)\n",
        status_icon,
        results.benchmark(),
        results.results.run_count()
    ));

    for metric in &results.results.metrics {
        output.push_str(&format_metric(metric));
    }

    for fault in &results.results.faults {
        output.push_str(&format!("      error: {}\n", fault));
    }

    for verdict in &results.assertion_results {
        let icon = if verdict.passed { "✓" } else { "✗" };
        output.push_str(&format!("      {} {}\n", icon, verdict.message));
    }

    for metric in &results.measured_only {
        output.push_str(&format!("      · {}\n", measured_only_line(metric)));
    }

    output
}

fn format_metric(metric: &AggregateMetrics) -> String {
    let stats = &metric.stats;
    let mut line = format!(
        "      {}: mean {} {}  min {}  max {}  stddev {}\n",
        metric.name,
        format_value(stats.mean),
        metric.unit,
        format_value(stats.min),
        format_value(stats.max),
        format_value(stats.std_dev),
    );
    if metric.per_second_stats.mean > 0.0 {
        line.push_str(&format!(
            "        per second: mean {} {}/s  min {}  max {}\n",
            format_value(metric.per_second_stats.mean),
            metric.unit,
            format_value(metric.per_second_stats.min),
            format_value(metric.per_second_stats.max),
        ));
    }
    line
}

/// Format a whole report for terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("NBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for bench in &report.benchmarks {
        let icon = match bench.status {
            BenchmarkStatus::Passed => "✓",
            BenchmarkStatus::Failed => "✗",
            BenchmarkStatus::Faulted => "💥",
        };
        output.push_str(&format!("  {} {} ({} runs)\n", icon, bench.name, bench.runs));
        for metric in &bench.metrics {
            output.push_str(&format_metric(metric));
        }
        for fault in &bench.faults {
            output.push_str(&format!("      error: {}\n", fault));
        }
        for line in &bench.measured_only {
            output.push_str(&format!("      · {}\n", line));
        }
        output.push('\n');
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Total: {}  Passed: {}  Failed: {}  Faulted: {}\n",
        report.summary.total_benchmarks,
        report.summary.passed,
        report.summary.failed,
        report.summary.faulted
    ));
    output.push_str(&format!(
        "  Assertions: {} passed, {} failed\n",
        report.summary.assertions_passed, report.summary.assertions_failed
    ));

    output
}

/// Streams progress and results to a writer as plain text
pub struct HumanOutput<W: Write> {
    writer: W,
    show_runs: bool,
}

impl<W: Write> HumanOutput<W> {
    /// Write to `writer`, results only
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_runs: false,
        }
    }

    /// Also print a line per trial
    pub fn with_runs(mut self, show_runs: bool) -> Self {
        self.show_runs = show_runs;
        self
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    // Write failures are dropped
    fn emit(&mut self, text: &str) {
        let _ = self.writer.write_all(text.as_bytes());
        let _ = self.writer.flush();
    }
}

impl HumanOutput<std::io::Stdout> {
    /// Stream to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> BenchmarkOutput for HumanOutput<W> {
    fn start_benchmark(&mut self, settings: &BenchmarkSettings) {
        let text = match settings.description() {
            Some(description) => format!("\n{} - {}\n", settings.name(), description),
            None => format!("\n{}\n", settings.name()),
        };
        self.emit(&text);
        self.emit(&format!("{}\n", "-".repeat(60)));
    }

    fn write_run(&mut self, report: &BenchmarkRunReport, is_warmup: bool) {
        if !self.show_runs {
            return;
        }
        let label = if is_warmup { "warmup" } else { "run" };
        let metrics: Vec<String> = report
            .metrics
            .iter()
            .map(|m| format!("{}={}", m.name, format_value(m.value)))
            .collect();
        self.emit(&format!(
            "    {} {:.3} ms  {}\n",
            label,
            report.elapsed_nanos as f64 / 1_000_000.0,
            metrics.join("  ")
        ));
    }

    fn write_final_results(&mut self, results: &BenchmarkFinalResults) {
        self.emit(&format_final_results(results));
    }

    fn report_error(&mut self, benchmark: &str, fault: &TrialFault) {
        self.emit(&format!("    ! {}: {}\n", benchmark, fault));
    }

    fn write_line(&mut self, line: &str) {
        self.emit(&format!("{}\n", line));
    }
}
