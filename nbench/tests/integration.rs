//! Integration tests for NBench
//!
//! These tests verify the end-to-end behavior of the measurement engine.

use nbench::prelude::*;
use nbench::{
    BenchmarkBuilder, BenchmarkStat, BuildError, CancellationToken, CollectingOutput, Collector,
    MeasureBucket, MeasurementSetting, MetricCollector, MetricKind, MetricsCollectorSelector,
    SelectorRegistry, WarmupData, evaluate_assertion, run_benchmark,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Replays a fixed series of readings, holding the last one
struct Replay {
    values: Vec<f64>,
    next: usize,
}

impl Replay {
    fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }
}

impl MetricCollector for Replay {
    fn collect(&mut self) -> f64 {
        let value = self.values[self.next.min(self.values.len() - 1)];
        self.next += 1;
        value
    }
}

fn count(ctx: &BenchmarkContext) {
    if let Some(counter) = ctx.counter("ops") {
        counter.increment();
    }
}

#[test]
fn test_bucket_reports_first_to_last_delta() {
    let series: &[&[f64]] = &[&[7.0], &[1.0, 4.0], &[10.0, 3.0, 2.5, 40.0]];

    for values in series {
        let name = MetricName::Timing(TimingMetric::ElapsedTime);
        let mut bucket = MeasureBucket::new(Collector::new(name, "ms", Replay::new(values.to_vec())));
        for (i, _) in values.iter().enumerate() {
            bucket.collect(i as u64 * 1_000);
        }

        let report = bucket.to_report();
        let expected = values[values.len() - 1] - values[0];
        assert_eq!(report.value, expected);
        assert!(report.elapsed_nanos >= 1);
    }
}

#[test]
fn test_benchmark_stat_reference_values() {
    let stat = BenchmarkStat::new(&[1.0, 2.0, 3.0]);
    assert_eq!(stat.max, 3.0);
    assert_eq!(stat.min, 1.0);
    assert_eq!(stat.mean, 2.0);
    assert!((stat.std_dev - 1.0).abs() < 1e-12);

    for values in [&[][..], &[0.0][..]] {
        let stat = BenchmarkStat::new(values);
        assert_eq!((stat.max, stat.min, stat.mean, stat.std_dev), (0.0, 0.0, 0.0, 0.0));
    }
}

#[test]
fn test_always_failing_body_yields_one_faulted_report() {
    let settings = BenchmarkSettings::builder("always_fails")
        .iterations(10)
        .counter_total("ops", Assertion::greater_than_or_equal(0.0))
        .build()
        .unwrap();

    let attempts = Arc::new(AtomicU64::new(0));
    let seen = attempts.clone();
    let invoker = BenchmarkMethods::fallible(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Err("boom".into())
    });

    let results = run_benchmark(settings, invoker).unwrap();
    assert_eq!(results.results.run_count(), 1);
    assert!(results.is_faulted());
    assert!(!results.all_asserts_passed);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_body_is_captured() {
    let settings = BenchmarkSettings::builder("panics")
        .skip_warmup(true)
        .iterations(5)
        .counter("ops")
        .build()
        .unwrap();

    let mut calls = 0;
    let invoker = BenchmarkMethods::new(move |ctx| {
        calls += 1;
        count(ctx);
        if calls == 3 {
            panic!("third call");
        }
    });

    let mut output = CollectingOutput::new();
    let results = nbench::Benchmark::new(settings, invoker).run(&mut output).unwrap();
    assert_eq!(results.results.run_count(), 3);
    assert!(results.is_faulted());
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].1.message.contains("third call"));
}

#[test]
fn test_counter_throughput_matches_direct_computation() {
    let settings = BenchmarkSettings::builder("counter_throughput")
        .run_mode(RunMode::Throughput)
        .run_time(Duration::from_secs(1))
        .iterations(1)
        .counter_throughput("ops", Assertion::greater_than(1_000_000.0))
        .build()
        .unwrap();

    let results = run_benchmark(settings, BenchmarkMethods::new(count)).unwrap();
    assert!(!results.is_faulted());

    let ops = MetricName::counter("ops");
    let metric = results.results.metric(&ops).unwrap();

    let direct: Vec<f64> = results
        .results
        .reports
        .iter()
        .filter_map(|r| r.metric(&ops))
        .map(|m| m.value / (m.elapsed_nanos as f64 / 1e9))
        .collect();
    let direct_mean = direct.iter().sum::<f64>() / direct.len() as f64;
    assert!((metric.per_second_stats.mean - direct_mean).abs() <= direct_mean * 1e-9);

    assert_eq!(results.assertion_results.len(), 1);
    assert_eq!(results.assertion_results[0].passed, direct_mean > 1_000_000.0);
    assert_eq!(results.all_asserts_passed, direct_mean > 1_000_000.0);
}

#[test]
fn test_duplicate_metric_collected_once_and_asserted_twice() {
    let settings = BenchmarkSettings::builder("dedupe")
        .iterations(3)
        .counter_total("ops", Assertion::exactly(1.0))
        .counter_throughput("ops", Assertion::greater_than(0.0))
        .build()
        .unwrap();

    let run = BenchmarkBuilder::new(settings.clone())
        .new_run(&WarmupData::PRE_WARMUP, &CancellationToken::new())
        .unwrap();
    assert_eq!(run.buckets().len(), 1);
    drop(run);

    let results = run_benchmark(settings, BenchmarkMethods::new(count)).unwrap();
    assert_eq!(results.results.metrics.len(), 1);
    assert_eq!(results.assertion_results.len(), 2);
    assert!(results.all_asserts_passed);
}

#[test]
fn test_between_is_inclusive() {
    let assertion = Assertion::between(1.0, 2.0).unwrap();
    assert!(assertion.test(1.0));
    assert!(assertion.test(1.5));
    assert!(assertion.test(2.0));
    assert!(!assertion.test(0.999));
    assert!(!assertion.test(2.001));

    assert!(matches!(
        BenchmarkSettings::builder("bad")
            .assert_condition(
                MetricName::counter("ops"),
                nbench::ConditionKind::Between,
                1.0,
                None,
                AssertionType::Total,
            )
            .build(),
        Err(BuildError::Assertion { .. })
    ));
}

#[test]
fn test_message_round_trip_reproduces_verdict() {
    let assertion = Assertion::less_than(10.0);
    for actual in [3.0, 10.0, 42.0] {
        let result = evaluate_assertion(
            "[Counter] ops",
            "operations",
            &assertion,
            AssertionType::Total,
            actual,
        )
        .unwrap();
        assert_eq!(
            nbench::AssertionResult::passed_from_message(&result.message),
            Some(result.passed)
        );
    }
}

#[test]
fn test_measurement_mode_skips_assertions() {
    let settings = BenchmarkSettings::builder("measure_only")
        .test_mode(TestMode::Measurement)
        .iterations(2)
        .counter_total("ops", Assertion::greater_than(1_000.0))
        .build()
        .unwrap();

    let results = run_benchmark(settings, BenchmarkMethods::new(count)).unwrap();
    assert!(results.assertion_results.is_empty());
    assert!(results.all_asserts_passed);
}

/// Reports a fixed cost per trial for elapsed time
struct FixedCost;

impl MetricsCollectorSelector for FixedCost {
    fn create(
        &self,
        _run_mode: RunMode,
        _warmup: &WarmupData,
        setting: &MeasurementSetting,
    ) -> Vec<Collector> {
        vec![Collector::new(
            setting.metric.clone(),
            "ms",
            Replay::new(vec![0.0, 5.0]),
        )]
    }
}

#[test]
fn test_custom_selector_drives_assertions() {
    let mut registry = SelectorRegistry::new();
    registry.register(MetricKind::Timing, FixedCost);

    let elapsed = MetricName::Timing(TimingMetric::ElapsedTime);
    let settings = BenchmarkSettings::builder("custom")
        .selectors(registry)
        .iterations(4)
        .assert(elapsed.clone(), Assertion::exactly(5.0), AssertionType::Total)
        .build()
        .unwrap();

    let results = run_benchmark(settings, BenchmarkMethods::new(|_| {})).unwrap();
    let metric = results.results.metric(&elapsed).unwrap();
    assert_eq!(metric.stats.mean, 5.0);
    assert_eq!(metric.stats.std_dev, 0.0);
    assert!(results.all_asserts_passed);
}

#[test]
fn test_missing_selector_is_a_build_error() {
    let result = BenchmarkSettings::builder("no_selector")
        .selectors(SelectorRegistry::new())
        .measure(MetricName::Timing(TimingMetric::CpuCycles))
        .build();

    assert_eq!(result.unwrap_err(), BuildError::MissingSelector(MetricKind::Timing));
}

#[test]
fn test_catalog_results_serialize_to_json() {
    let mut catalog = BenchmarkCatalog::new();
    catalog
        .register("json", |b| b.iterations(2).counter("ops"), || BenchmarkMethods::new(count))
        .unwrap();

    let entry = catalog.get("json").unwrap();
    let results = entry.instantiate().run(&mut nbench::NullOutput).unwrap();

    let mut report = nbench::Report::new();
    report.push(&results);
    let json = serde_json::to_string(&report).unwrap();
    let parsed: nbench::Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.benchmarks[0].name, "json");
    assert_eq!(parsed.benchmarks[0].runs, 2);
    assert!(parsed.summary.all_passed());
}
