//! Run Builder
//!
//! Turns validated settings into a fresh [`BenchmarkRun`] for every trial.

use crate::bucket::MeasureBucket;
use crate::context::{BenchmarkContext, CancellationToken, Counter};
use crate::error::BuildError;
use crate::metrics::MetricName;
use crate::run::BenchmarkRun;
use crate::selectors::{CounterSelector, ResourceLease};
use crate::settings::BenchmarkSettings;
use crate::warmup::WarmupData;
use fxhash::FxHashMap;
use tracing::trace;

/// Creates the per-trial runs of one benchmark
#[derive(Debug, Clone)]
pub struct BenchmarkBuilder {
    settings: BenchmarkSettings,
}

impl BenchmarkBuilder {
    /// Builder producing runs for `settings`
    pub fn new(settings: BenchmarkSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// Leases on the shared resources of every measured metric.
    ///
    /// Held for the duration of a benchmark so pooled sources stay open between
    /// trials instead of being reopened for each one.
    pub fn lease_resources(&self) -> Vec<ResourceLease> {
        let settings = &self.settings;
        settings
            .distinct_measurements()
            .iter()
            .filter_map(|setting| {
                let selector = settings.selectors().get(setting.metric.kind())?;
                selector.lease(setting)
            })
            .collect()
    }

    /// Build the run for one trial.
    ///
    /// Each distinct concrete metric gets exactly one bucket, however many
    /// settings name it directly or through `SizeClass::All`. Counters are
    /// created fresh and exposed through the run's context.
    pub fn new_run(
        &self,
        warmup: &WarmupData,
        cancellation: &CancellationToken,
    ) -> Result<BenchmarkRun, BuildError> {
        let settings = &self.settings;
        let mut buckets = Vec::new();
        let mut counters = FxHashMap::default();

        for setting in settings.distinct_measurements() {
            match &setting.metric {
                MetricName::Counter(name) => {
                    let counter = Counter::new();
                    counters.insert(name.clone(), counter.clone());
                    buckets.push(MeasureBucket::new(CounterSelector::create(
                        setting.metric.clone(),
                        counter,
                    )));
                }
                metric => {
                    let kind = metric.kind();
                    let selector = settings
                        .selectors()
                        .get(kind)
                        .ok_or(BuildError::MissingSelector(kind))?;
                    buckets.extend(
                        selector
                            .create(settings.run_mode(), warmup, &setting)
                            .into_iter()
                            .map(MeasureBucket::new),
                    );
                }
            }
        }

        if buckets.is_empty() {
            return Err(BuildError::NoMetrics(settings.name().to_string()));
        }

        trace!(
            benchmark = settings.name(),
            buckets = buckets.len(),
            counters = counters.len(),
            "built run"
        );

        let context = BenchmarkContext::new(settings.name(), counters, cancellation.clone());
        Ok(BenchmarkRun::new(buckets, context))
    }
}
