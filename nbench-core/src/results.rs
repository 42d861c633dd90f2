//! Benchmark Results
//!
//! Cross-run reduction of the retained trial reports.

use crate::metrics::MetricName;
use crate::report::{BenchmarkRunReport, TrialFault};
use fxhash::FxHashMap;
use nbench_logic::{AssertionResult, AssertionType};
use nbench_stats::{AggregateStats, BenchmarkStat, Observation, aggregate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Aggregated statistics of one metric over all trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    /// Benchmark or metric name
    pub name: MetricName,
    /// Unit label
    pub unit: String,
    /// Trials that collected this metric
    pub runs: usize,
    /// Statistics of the per-trial values
    pub stats: BenchmarkStat,
    /// Statistics of the per-trial values normalised to one second
    pub per_second_stats: BenchmarkStat,
    /// Statistics of the nanoseconds spent per unit
    pub nanos_per_unit_stats: BenchmarkStat,
}

impl AggregateMetrics {
    fn new(name: MetricName, unit: String, observations: &[Observation]) -> Self {
        let AggregateStats {
            stats,
            per_second_stats,
            nanos_per_unit_stats,
        } = aggregate(observations);
        Self {
            name,
            unit,
            runs: observations.len(),
            stats,
            per_second_stats,
            nanos_per_unit_stats,
        }
    }

    /// All-zero aggregate for a metric no trial observed
    pub fn unobserved(name: MetricName) -> Self {
        let unit = name.unit().to_string();
        Self::new(name, unit, &[])
    }

    /// The mean an assertion of `assertion_type` is tested against
    pub fn mean_for(&self, assertion_type: AssertionType) -> f64 {
        match assertion_type {
            AssertionType::Total => self.stats.mean,
            AssertionType::Throughput => self.per_second_stats.mean,
        }
    }
}

/// Completed trials of one benchmark and their statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResults {
    /// Benchmark name
    pub benchmark: String,
    /// Retained trial reports, oldest first
    pub reports: Vec<BenchmarkRunReport>,
    /// One entry per metric, in first-seen order
    pub metrics: Vec<AggregateMetrics>,
    /// Every fault raised by any trial
    pub faults: Vec<TrialFault>,
}

impl BenchmarkResults {
    /// Aggregate `reports`. Empty input yields empty statistics.
    pub fn compile(benchmark: impl Into<String>, reports: Vec<BenchmarkRunReport>) -> Self {
        // Group observations by metric, remembering first-seen order
        let mut order: Vec<(MetricName, String)> = Vec::new();
        let mut groups: FxHashMap<MetricName, Vec<Observation>> = FxHashMap::default();
        for report in &reports {
            for entry in &report.metrics {
                let group = groups.entry(entry.name.clone()).or_insert_with(|| {
                    order.push((entry.name.clone(), entry.unit.clone()));
                    Vec::with_capacity(reports.len())
                });
                group.push(entry.observation());
            }
        }

        let metrics = order
            .into_par_iter()
            .map(|(name, unit)| {
                let observations = groups.get(&name).map(Vec::as_slice).unwrap_or(&[]);
                AggregateMetrics::new(name, unit, observations)
            })
            .collect();

        let faults = reports
            .iter()
            .flat_map(|r| r.faults.iter().cloned())
            .collect();

        Self {
            benchmark: benchmark.into(),
            reports,
            metrics,
            faults,
        }
    }

    /// Whether any retained trial faulted
    pub fn is_faulted(&self) -> bool {
        !self.faults.is_empty()
    }

    /// Statistics for `name`, if any trial collected it
    pub fn metric(&self, name: &MetricName) -> Option<&AggregateMetrics> {
        self.metrics.iter().find(|m| &m.name == name)
    }

    /// Statistics for `name`, all zero when no trial collected it
    pub fn metric_or_unobserved(&self, name: &MetricName) -> AggregateMetrics {
        self.metric(name)
            .cloned()
            .unwrap_or_else(|| AggregateMetrics::unobserved(name.clone()))
    }

    /// Number of retained trial reports
    pub fn run_count(&self) -> usize {
        self.reports.len()
    }
}

/// Results plus the verdict of every assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkFinalResults {
    /// Compiled trial results
    pub results: BenchmarkResults,
    /// One verdict per evaluated assertion
    pub assertion_results: Vec<AssertionResult>,
    /// True iff every assertion passed and no trial faulted
    pub all_asserts_passed: bool,
    /// Collected metrics that no assertion was evaluated against
    #[serde(default)]
    pub measured_only: Vec<MetricName>,
}

impl BenchmarkFinalResults {
    /// Combine results with their verdicts and derive `all_asserts_passed`
    pub fn new(results: BenchmarkResults, assertion_results: Vec<AssertionResult>) -> Self {
        let all_asserts_passed =
            !results.is_faulted() && assertion_results.iter().all(|r| r.passed);
        Self {
            results,
            assertion_results,
            all_asserts_passed,
            measured_only: Vec::new(),
        }
    }

    /// Record the metrics that were collected without a verdict
    pub fn with_measured_only(mut self, metrics: Vec<MetricName>) -> Self {
        self.measured_only = metrics;
        self
    }

    /// Name of the benchmark
    pub fn benchmark(&self) -> &str {
        &self.results.benchmark
    }

    /// Whether a fault was recorded
    pub fn is_faulted(&self) -> bool {
        self.results.is_faulted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FaultPhase, MetricRunReport};

    fn report(ops: f64, elapsed_nanos: u64) -> BenchmarkRunReport {
        BenchmarkRunReport {
            benchmark: "b".to_string(),
            elapsed_nanos,
            metrics: vec![MetricRunReport {
                name: MetricName::counter("ops"),
                unit: "operations".to_string(),
                value: ops,
                elapsed_nanos,
            }],
            faults: Vec::new(),
        }
    }

    #[test]
    fn test_compile_groups_by_metric() {
        let results = BenchmarkResults::compile(
            "b",
            vec![
                report(1.0, 1_000_000_000),
                report(2.0, 1_000_000_000),
                report(3.0, 1_000_000_000),
            ],
        );

        let ops = results.metric(&MetricName::counter("ops")).unwrap();
        assert_eq!(ops.runs, 3);
        assert_eq!(ops.stats.mean, 2.0);
        assert_eq!(ops.stats.std_dev, 1.0);
        assert_eq!(ops.per_second_stats.max, 3.0);
        assert_eq!(ops.unit, "operations");
    }

    #[test]
    fn test_empty_results() {
        let results = BenchmarkResults::compile("b", Vec::new());
        assert!(results.metrics.is_empty());
        assert!(!results.is_faulted());

        let missing = results.metric_or_unobserved(&MetricName::counter("ops"));
        assert_eq!(missing.runs, 0);
        assert_eq!(missing.stats, BenchmarkStat::default());
    }

    #[test]
    fn test_faults_are_unioned() {
        let mut faulted = report(1.0, 10);
        faulted
            .faults
            .push(TrialFault::new(FaultPhase::Run, "boom"));
        let results = BenchmarkResults::compile("b", vec![report(1.0, 10), faulted]);

        assert!(results.is_faulted());
        assert_eq!(results.faults.len(), 1);

        let final_results = BenchmarkFinalResults::new(results, Vec::new());
        assert!(!final_results.all_asserts_passed);
    }

    #[test]
    fn test_mean_for_assertion_type() {
        let results = BenchmarkResults::compile("b", vec![report(10.0, 500_000_000)]);
        let ops = results.metric(&MetricName::counter("ops")).unwrap();
        assert_eq!(ops.mean_for(AssertionType::Total), 10.0);
        assert_eq!(ops.mean_for(AssertionType::Throughput), 20.0);
    }
}
