//! Report Data Structures

use chrono::{DateTime, Utc};
use nbench_core::{AggregateMetrics, BenchmarkFinalResults, MetricName, TrialFault};
use nbench_logic::{AssertionResult, MEASURED_ONLY, aggregate_assertions};
use serde::{Deserialize, Serialize};

/// Current JSON schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete report for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report metadata
    pub meta: ReportMeta,
    /// One entry per benchmark
    pub benchmarks: Vec<BenchmarkReportResult>,
    /// Totals across benchmarks
    pub summary: ReportSummary,
}

impl Report {
    /// Report stamped with the current time and host
    pub fn new() -> Self {
        Self {
            meta: ReportMeta::now(),
            benchmarks: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    /// Append one benchmark and update the summary
    pub fn push(&mut self, results: &BenchmarkFinalResults) {
        let entry = BenchmarkReportResult::from(results);
        self.summary.record(&entry);
        self.benchmarks.push(entry);
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// JSON schema version
    pub schema_version: u32,
    /// NBench version that wrote the report
    pub version: String,
    /// When the report was written
    pub timestamp: DateTime<Utc>,
    /// Host description
    pub system: SystemInfo,
}

impl ReportMeta {
    /// Metadata stamped with the current time
    pub fn now() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system: SystemInfo::detect(),
        }
    }
}

/// Host the benchmarks ran on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// Available CPU cores
    pub cpu_cores: u32,
}

impl SystemInfo {
    /// Describe the host
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1),
        }
    }
}

/// Outcome of one benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    /// Every assertion held
    Passed,
    /// At least one assertion failed
    Failed,
    /// User code raised an error or panicked
    Faulted,
}

/// One benchmark in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReportResult {
    /// Benchmark or metric name
    pub name: String,
    /// Overall outcome
    pub status: BenchmarkStatus,
    /// Retained trial count
    pub runs: usize,
    /// Aggregated metrics
    pub metrics: Vec<AggregateMetrics>,
    /// Assertion verdicts
    pub assertions: Vec<AssertionResult>,
    /// `"<metric>: measured only"` for every metric without a verdict
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measured_only: Vec<String>,
    /// Faults raised by user code
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<TrialFault>,
}

/// Line shown for a metric that was collected but not asserted
pub fn measured_only_line(metric: &MetricName) -> String {
    format!("{metric}: {MEASURED_ONLY}")
}

impl From<&BenchmarkFinalResults> for BenchmarkReportResult {
    fn from(results: &BenchmarkFinalResults) -> Self {
        let status = if results.is_faulted() {
            BenchmarkStatus::Faulted
        } else if results.all_asserts_passed {
            BenchmarkStatus::Passed
        } else {
            BenchmarkStatus::Failed
        };
        Self {
            name: results.benchmark().to_string(),
            status,
            runs: results.results.run_count(),
            metrics: results.results.metrics.clone(),
            assertions: results.assertion_results.clone(),
            measured_only: results.measured_only.iter().map(measured_only_line).collect(),
            faults: results.results.faults.clone(),
        }
    }
}

/// Report summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of benchmarks
    pub total_benchmarks: usize,
    /// Number passed
    pub passed: usize,
    /// Number failed
    pub failed: usize,
    /// Number faulted
    pub faulted: usize,
    /// Passed verdicts
    pub assertions_passed: usize,
    /// Failed verdicts
    pub assertions_failed: usize,
}

impl ReportSummary {
    fn record(&mut self, entry: &BenchmarkReportResult) {
        self.total_benchmarks += 1;
        match entry.status {
            BenchmarkStatus::Passed => self.passed += 1,
            BenchmarkStatus::Failed => self.failed += 1,
            BenchmarkStatus::Faulted => self.faulted += 1,
        }
        let assertions = aggregate_assertions(&entry.assertions);
        self.assertions_passed += assertions.passed;
        self.assertions_failed += assertions.failed;
    }

    /// Whether the invocation should be treated as successful
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.faulted == 0
    }
}
