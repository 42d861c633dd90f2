//! Benchmark Settings
//!
//! Immutable configuration for one benchmark, assembled through
//! [`BenchmarkSettingsBuilder`] and validated before any trial runs.

use crate::error::BuildError;
use crate::metrics::{MetricKind, MetricName, TimingMetric};
use crate::selectors::SelectorRegistry;
use crate::warmup::WarmupData;
use nbench_logic::{Assertion, AssertionType, ConditionKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide default sampling precision: the fast-path threshold and the
/// background sampler's interval
pub const DEFAULT_SAMPLING_PRECISION: Duration = Duration::from_millis(10);

/// Default number of trials
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Default run-time budget per throughput trial
pub const DEFAULT_RUN_TIME: Duration = Duration::from_secs(1);

/// How each trial is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One execution of the body per trial
    #[default]
    Iterations,
    /// Execute the body repeatedly until the run-time budget elapses
    Throughput,
}

impl RunMode {
    /// Whether a trial can be timed synchronously on the caller's thread.
    ///
    /// Only short iteration-mode bodies qualify; everything else is sampled
    /// from a background thread.
    pub fn samples_synchronously(self, warmup: &WarmupData, precision: Duration) -> bool {
        self == RunMode::Iterations && warmup.elapsed() <= precision
    }
}

/// Whether assertions are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Measure and evaluate assertions
    #[default]
    Test,
    /// Measure only; assertions are not evaluated
    Measurement,
}

/// One declared measurement: a metric and what is expected of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSetting {
    /// Metric the setting applies to
    pub metric: MetricName,
    /// `Assertion::Empty` for a measure-only setting
    pub assertion: Assertion,
    /// Whether the total or the per-second mean is asserted
    pub assertion_type: AssertionType,
}

impl MeasurementSetting {
    /// A measure-only setting
    pub fn measure(metric: MetricName) -> Self {
        Self {
            metric,
            assertion: Assertion::Empty,
            assertion_type: AssertionType::Total,
        }
    }

    /// A setting with an assertion
    pub fn assert(metric: MetricName, assertion: Assertion, assertion_type: AssertionType) -> Self {
        Self {
            metric,
            assertion,
            assertion_type,
        }
    }
}

/// Validated configuration for one benchmark
#[derive(Debug, Clone)]
pub struct BenchmarkSettings {
    name: String,
    description: Option<String>,
    test_mode: TestMode,
    run_mode: RunMode,
    iterations: u32,
    run_time: Duration,
    sampling_precision: Duration,
    settle_time: Duration,
    skip_warmup: bool,
    measurements: Vec<MeasurementSetting>,
    selectors: SelectorRegistry,
    custom_selectors: bool,
}

impl BenchmarkSettings {
    /// Start building settings for the benchmark called `name`
    pub fn builder(name: impl Into<String>) -> BenchmarkSettingsBuilder {
        BenchmarkSettingsBuilder::new(name)
    }

    /// Metric or benchmark name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether assertions are evaluated
    pub fn test_mode(&self) -> TestMode {
        self.test_mode
    }

    /// Iteration or throughput mode
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Number of measured trials
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Budget per throughput trial; timeout guard for escalated iteration trials
    pub fn run_time(&self) -> Duration {
        self.run_time
    }

    /// Interval between background samples
    pub fn sampling_precision(&self) -> Duration {
        self.sampling_precision
    }

    /// Quiet period inserted between trials
    pub fn settle_time(&self) -> Duration {
        self.settle_time
    }

    /// Whether the warmup trial is skipped
    pub fn skip_warmup(&self) -> bool {
        self.skip_warmup
    }

    /// Every declared measurement, including several on the same metric
    pub fn measurements(&self) -> &[MeasurementSetting] {
        &self.measurements
    }

    /// Collector selectors by metric family
    pub fn selectors(&self) -> &SelectorRegistry {
        &self.selectors
    }

    /// A builder pre-filled with these settings, for applying overrides.
    ///
    /// The default selector registry is recreated on build so it follows a
    /// changed sampling precision; a registry supplied by the caller is kept.
    pub fn to_builder(&self) -> BenchmarkSettingsBuilder {
        BenchmarkSettingsBuilder {
            name: self.name.clone(),
            description: self.description.clone(),
            test_mode: self.test_mode,
            run_mode: self.run_mode,
            iterations: self.iterations,
            run_time: self.run_time,
            sampling_precision: self.sampling_precision,
            settle_time: self.settle_time,
            skip_warmup: self.skip_warmup,
            measurements: self.measurements.clone(),
            selectors: self.custom_selectors.then(|| self.selectors.clone()),
            errors: Vec::new(),
        }
    }

    /// One measure-only setting per distinct concrete metric, in declaration order.
    ///
    /// Aggregate metrics such as `SizeClass::All` are expanded first, so a
    /// concrete metric declared both directly and through an aggregate is
    /// collected once. Assertions are dropped here: they do not affect what is
    /// collected.
    pub fn distinct_measurements(&self) -> Vec<MeasurementSetting> {
        let mut distinct: Vec<MeasurementSetting> = Vec::with_capacity(self.measurements.len());
        for setting in &self.measurements {
            for metric in setting.metric.concrete() {
                if !distinct.iter().any(|d| d.metric == metric) {
                    distinct.push(MeasurementSetting::measure(metric));
                }
            }
        }
        distinct
    }

    /// Measurements that carry an assertion
    pub fn asserted_measurements(&self) -> impl Iterator<Item = &MeasurementSetting> {
        self.measurements.iter().filter(|s| !s.assertion.is_empty())
    }
}

/// Builder for [`BenchmarkSettings`]
#[derive(Debug)]
pub struct BenchmarkSettingsBuilder {
    name: String,
    description: Option<String>,
    test_mode: TestMode,
    run_mode: RunMode,
    iterations: u32,
    run_time: Duration,
    sampling_precision: Duration,
    settle_time: Duration,
    skip_warmup: bool,
    measurements: Vec<MeasurementSetting>,
    selectors: Option<SelectorRegistry>,
    errors: Vec<BuildError>,
}

impl BenchmarkSettingsBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            test_mode: TestMode::default(),
            run_mode: RunMode::default(),
            iterations: DEFAULT_ITERATIONS,
            run_time: DEFAULT_RUN_TIME,
            sampling_precision: DEFAULT_SAMPLING_PRECISION,
            settle_time: Duration::ZERO,
            skip_warmup: false,
            measurements: Vec::new(),
            selectors: None,
            errors: Vec::new(),
        }
    }

    /// Free-form description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether assertions are evaluated
    pub fn test_mode(mut self, mode: TestMode) -> Self {
        self.test_mode = mode;
        self
    }

    /// Iteration or throughput mode
    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = mode;
        self
    }

    /// Number of measured trials
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Work budget of a throughput trial, or overrun guard in iteration mode
    pub fn run_time(mut self, run_time: Duration) -> Self {
        self.run_time = run_time;
        self
    }

    /// Interval between background samples
    pub fn sampling_precision(mut self, precision: Duration) -> Self {
        self.sampling_precision = precision;
        self
    }

    /// Pause before each trial
    pub fn settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    /// Whether the warmup trial is skipped
    pub fn skip_warmup(mut self, skip: bool) -> Self {
        self.skip_warmup = skip;
        self
    }

    /// Replace the default selector registry
    pub fn selectors(mut self, selectors: SelectorRegistry) -> Self {
        self.selectors = Some(selectors);
        self
    }

    /// Measure `metric` without asserting anything
    pub fn measure(mut self, metric: MetricName) -> Self {
        self.measurements.push(MeasurementSetting::measure(metric));
        self
    }

    /// Measure `metric` and assert on its aggregate
    pub fn assert(
        mut self,
        metric: MetricName,
        assertion: Assertion,
        assertion_type: AssertionType,
    ) -> Self {
        self.measurements
            .push(MeasurementSetting::assert(metric, assertion, assertion_type));
        self
    }

    /// Assert using a declared operator and raw thresholds; invalid declarations
    /// (such as `Between` without an upper bound) surface from [`build`](Self::build)
    pub fn assert_condition(
        self,
        metric: MetricName,
        kind: ConditionKind,
        value: f64,
        upper: Option<f64>,
        assertion_type: AssertionType,
    ) -> Self {
        match Assertion::new(kind, value, upper) {
            Ok(assertion) => self.assert(metric, assertion, assertion_type),
            Err(source) => {
                let mut this = self;
                this.errors.push(BuildError::Assertion {
                    metric: metric.to_string(),
                    source,
                });
                this
            }
        }
    }

    /// Declare a counter and measure it
    pub fn counter(self, name: impl Into<String>) -> Self {
        self.measure(MetricName::counter(name))
    }

    /// Declare a counter and assert on its total per trial
    pub fn counter_total(self, name: impl Into<String>, assertion: Assertion) -> Self {
        self.assert(MetricName::counter(name), assertion, AssertionType::Total)
    }

    /// Declare a counter and assert on its per-second rate
    pub fn counter_throughput(self, name: impl Into<String>, assertion: Assertion) -> Self {
        self.assert(MetricName::counter(name), assertion, AssertionType::Throughput)
    }

    /// Validate and produce the settings
    pub fn build(self) -> Result<BenchmarkSettings, BuildError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        if self.measurements.is_empty() {
            return Err(BuildError::NoMetrics(self.name));
        }
        if self.iterations == 0 {
            return Err(BuildError::ZeroIterations);
        }
        if self.sampling_precision.is_zero() {
            return Err(BuildError::ZeroPrecision);
        }
        if self.run_mode == RunMode::Throughput && self.run_time.is_zero() {
            return Err(BuildError::ZeroRunTime);
        }

        for setting in &self.measurements {
            // Milliseconds per second is not a rate anyone can act on
            if setting.metric == MetricName::Timing(TimingMetric::ElapsedTime)
                && setting.assertion_type == AssertionType::Throughput
                && !setting.assertion.is_empty()
            {
                return Err(BuildError::UnsupportedAssertion {
                    metric: setting.metric.to_string(),
                    assertion_type: setting.assertion_type,
                });
            }
        }

        let custom_selectors = self.selectors.is_some();
        let selectors = self
            .selectors
            .unwrap_or_else(|| SelectorRegistry::with_precision(self.sampling_precision));

        for setting in &self.measurements {
            let kind = setting.metric.kind();
            if kind != MetricKind::Counter && !selectors.contains(kind) {
                return Err(BuildError::MissingSelector(kind));
            }
        }

        Ok(BenchmarkSettings {
            name: self.name,
            description: self.description,
            test_mode: self.test_mode,
            run_mode: self.run_mode,
            iterations: self.iterations,
            run_time: self.run_time,
            sampling_precision: self.sampling_precision,
            settle_time: self.settle_time,
            skip_warmup: self.skip_warmup,
            measurements: self.measurements,
            selectors,
            custom_selectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MemoryMetric, SizeClass};

    #[test]
    fn test_defaults() {
        let settings = BenchmarkSettings::builder("b").counter("ops").build().unwrap();

        assert_eq!(settings.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(settings.run_mode(), RunMode::Iterations);
        assert_eq!(settings.test_mode(), TestMode::Test);
        assert_eq!(settings.sampling_precision(), DEFAULT_SAMPLING_PRECISION);
        assert!(!settings.skip_warmup());
    }

    #[test]
    fn test_no_metrics_is_an_error() {
        let err = BenchmarkSettings::builder("empty").build().unwrap_err();
        assert_eq!(err, BuildError::NoMetrics("empty".to_string()));
    }

    #[test]
    fn test_zero_iterations_is_an_error() {
        let err = BenchmarkSettings::builder("b")
            .counter("ops")
            .iterations(0)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroIterations);
    }

    #[test]
    fn test_between_without_upper_bound_fails_at_build() {
        let err = BenchmarkSettings::builder("b")
            .assert_condition(
                MetricName::counter("ops"),
                ConditionKind::Between,
                1.0,
                None,
                AssertionType::Total,
            )
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::Assertion { .. }));
    }

    #[test]
    fn test_elapsed_time_throughput_unsupported() {
        let err = BenchmarkSettings::builder("b")
            .assert(
                MetricName::Timing(TimingMetric::ElapsedTime),
                Assertion::less_than(5.0),
                AssertionType::Throughput,
            )
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::UnsupportedAssertion { .. }));
    }

    #[test]
    fn test_missing_selector() {
        let err = BenchmarkSettings::builder("b")
            .measure(MetricName::Memory(MemoryMetric::TotalBytesAllocated))
            .selectors(SelectorRegistry::new())
            .build()
            .unwrap_err();

        assert_eq!(err, BuildError::MissingSelector(MetricKind::Memory));
    }

    #[test]
    fn test_throughput_requires_run_time() {
        let err = BenchmarkSettings::builder("b")
            .counter("ops")
            .run_mode(RunMode::Throughput)
            .run_time(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroRunTime);
    }

    #[test]
    fn test_distinct_measurements_dedupe_by_metric() {
        let settings = BenchmarkSettings::builder("b")
            .counter_throughput("ops", Assertion::greater_than(10.0))
            .counter_total("ops", Assertion::less_than(1e9))
            .measure(MetricName::Timing(TimingMetric::ElapsedTime))
            .build()
            .unwrap();

        assert_eq!(settings.measurements().len(), 3);
        let distinct = settings.distinct_measurements();
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].metric, MetricName::counter("ops"));
        assert_eq!(settings.asserted_measurements().count(), 2);
    }

    #[test]
    fn test_distinct_measurements_expand_size_classes() {
        let settings = BenchmarkSettings::builder("b")
            .measure(MetricName::Allocations(SizeClass::Small))
            .measure(MetricName::Allocations(SizeClass::All))
            .measure(MetricName::Allocations(SizeClass::Large))
            .build()
            .unwrap();

        let metrics: Vec<MetricName> = settings
            .distinct_measurements()
            .into_iter()
            .map(|s| s.metric)
            .collect();
        assert_eq!(
            metrics,
            vec![
                MetricName::Allocations(SizeClass::Small),
                MetricName::Allocations(SizeClass::Medium),
                MetricName::Allocations(SizeClass::Large),
            ]
        );
    }

    #[test]
    fn test_to_builder_applies_overrides() {
        let settings = BenchmarkSettings::builder("b")
            .counter_total("ops", Assertion::less_than(10.0))
            .iterations(3)
            .build()
            .unwrap();

        let rebuilt = settings
            .to_builder()
            .iterations(7)
            .sampling_precision(Duration::from_millis(2))
            .build()
            .unwrap();

        assert_eq!(rebuilt.name(), "b");
        assert_eq!(rebuilt.iterations(), 7);
        assert_eq!(rebuilt.sampling_precision(), Duration::from_millis(2));
        assert_eq!(rebuilt.measurements(), settings.measurements());
    }

    #[test]
    fn test_synchronous_sampling_predicate() {
        let fast = WarmupData::new(1_000, 1);
        let slow = WarmupData::new(50_000_000, 1);
        let precision = DEFAULT_SAMPLING_PRECISION;

        assert!(RunMode::Iterations.samples_synchronously(&fast, precision));
        assert!(!RunMode::Iterations.samples_synchronously(&slow, precision));
        assert!(!RunMode::Throughput.samples_synchronously(&fast, precision));
        // Exactly at the threshold still counts as fast
        let edge = WarmupData::new(precision.as_nanos() as u64, 1);
        assert!(RunMode::Iterations.samples_synchronously(&edge, precision));
    }
}
