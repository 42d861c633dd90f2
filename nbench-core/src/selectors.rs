//! Collector Selectors
//!
//! A selector turns a declared measurement into the collector(s) that read it
//! for one trial. Selectors are registered per [`MetricKind`] once, when the
//! settings are built, and asked for fresh collectors for every trial.

use crate::allocator::tracking_installed;
use crate::collectors::{
    AllocationCountCollector, Collector, CounterCollector, CpuCyclesCollector,
    ElapsedTimeCollector, ProcfsIoCollector, ProcfsIoPool, SizeClassCollector,
    TotalBytesCollector, UsageCollector, UsageScope,
};
use crate::context::Counter;
use crate::measure::HAS_CYCLE_COUNTER;
use crate::metrics::{MemoryMetric, MetricKind, MetricName, ProcessMetric, TimingMetric};
use crate::settings::{DEFAULT_SAMPLING_PRECISION, MeasurementSetting, RunMode};
use crate::warmup::WarmupData;
use fxhash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Factory for the collectors of one metric family
pub trait MetricsCollectorSelector: Send + Sync {
    /// Create the collectors for `setting` for a single trial.
    ///
    /// One setting may yield several collectors (see
    /// [`SizeClass::All`](crate::SizeClass::All)); a source that cannot be opened
    /// yields [`Collector::empty`].
    fn create(
        &self,
        run_mode: RunMode,
        warmup: &WarmupData,
        setting: &MeasurementSetting,
    ) -> Vec<Collector>;

    /// Hold a resource shared by the collectors of `setting` while a benchmark
    /// runs, so it stays open across trials. Most selectors have none.
    fn lease(&self, _setting: &MeasurementSetting) -> Option<ResourceLease> {
        None
    }
}

/// A reference to a pooled resource; the resource is released once every
/// lease and every collector using it is gone
pub type ResourceLease = Arc<dyn Any + Send + Sync>;

/// Maps each metric family to its selector
#[derive(Clone, Default)]
pub struct SelectorRegistry {
    selectors: FxHashMap<MetricKind, Arc<dyn MetricsCollectorSelector>>,
}

impl SelectorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in selectors, deciding sampling scope with `precision`
    pub fn with_precision(precision: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(MetricKind::Timing, TimingSelector);
        registry.register(MetricKind::Memory, MemorySelector);
        registry.register(MetricKind::Allocations, AllocationSelector);
        registry.register(MetricKind::Process, ProcessSelector::new(precision));
        registry
    }

    /// Register (or replace) the selector for `kind`
    pub fn register(&mut self, kind: MetricKind, selector: impl MetricsCollectorSelector + 'static) {
        self.selectors.insert(kind, Arc::new(selector));
    }

    /// Selector for `kind`
    pub fn get(&self, kind: MetricKind) -> Option<&Arc<dyn MetricsCollectorSelector>> {
        self.selectors.get(&kind)
    }

    /// Whether a selector is registered for `kind`
    pub fn contains(&self, kind: MetricKind) -> bool {
        self.selectors.contains_key(&kind)
    }
}

impl fmt::Debug for SelectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.selectors.keys().collect();
        kinds.sort();
        f.debug_struct("SelectorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

/// Wraps the per-trial counters created by the run builder
pub struct CounterSelector;

impl CounterSelector {
    /// Collector reading `counter` under `name`
    pub fn create(name: MetricName, counter: Counter) -> Collector {
        Collector::with_default_unit(name, CounterCollector::new(counter))
    }
}

/// Wall-clock and cycle timing
pub struct TimingSelector;

impl MetricsCollectorSelector for TimingSelector {
    fn create(&self, _: RunMode, _: &WarmupData, setting: &MeasurementSetting) -> Vec<Collector> {
        let name = setting.metric.clone();
        let collector = match name {
            MetricName::Timing(TimingMetric::ElapsedTime) => {
                Collector::with_default_unit(name, ElapsedTimeCollector::new())
            }
            MetricName::Timing(TimingMetric::CpuCycles) if HAS_CYCLE_COUNTER => {
                Collector::with_default_unit(name, CpuCyclesCollector::new())
            }
            other => {
                warn!(metric = %other, "no cycle counter on this platform, metric will read zero");
                Collector::empty(other)
            }
        };
        vec![collector]
    }
}

/// Heap totals from the tracking allocator
pub struct MemorySelector;

impl MetricsCollectorSelector for MemorySelector {
    fn create(&self, _: RunMode, _: &WarmupData, setting: &MeasurementSetting) -> Vec<Collector> {
        let name = setting.metric.clone();
        if !tracking_installed() {
            warn!(metric = %name, "TrackingAllocator is not the global allocator, metric will read zero");
            return vec![Collector::empty(name)];
        }

        let collector = match name {
            MetricName::Memory(MemoryMetric::TotalBytesAllocated) => {
                Collector::with_default_unit(name, TotalBytesCollector)
            }
            MetricName::Memory(MemoryMetric::AllocationCount) => {
                Collector::with_default_unit(name, AllocationCountCollector)
            }
            other => Collector::empty(other),
        };
        vec![collector]
    }
}

/// Allocation counts per size class; `SizeClass::All` yields one collector per class
pub struct AllocationSelector;

impl MetricsCollectorSelector for AllocationSelector {
    fn create(&self, _: RunMode, _: &WarmupData, setting: &MeasurementSetting) -> Vec<Collector> {
        let installed = tracking_installed();
        if !installed {
            warn!(metric = %setting.metric, "TrackingAllocator is not the global allocator, metric will read zero");
        }

        setting
            .metric
            .concrete()
            .into_iter()
            .map(|name| match name {
                MetricName::Allocations(class) if installed => {
                    Collector::with_default_unit(name, SizeClassCollector::new(class))
                }
                other => Collector::empty(other),
            })
            .collect()
    }
}

/// Operating-system counters.
///
/// Fault and context-switch counters read the calling thread's usage when the
/// trial runs synchronously on the sampling thread, and the whole process's
/// usage otherwise (the work then runs on a different thread than the sampler).
pub struct ProcessSelector {
    precision: Duration,
    io_pool: Arc<ProcfsIoPool>,
}

impl ProcessSelector {
    /// Selector for trials sampled every `precision`
    pub fn new(precision: Duration) -> Self {
        Self::with_pool(precision, Arc::new(ProcfsIoPool::new()))
    }

    /// Use a caller-provided I/O accounting pool
    pub fn with_pool(precision: Duration, io_pool: Arc<ProcfsIoPool>) -> Self {
        Self { precision, io_pool }
    }

    /// Scope the usage counters will read for a trial in `run_mode`
    pub fn usage_scope(&self, run_mode: RunMode, warmup: &WarmupData) -> UsageScope {
        if run_mode.samples_synchronously(warmup, self.precision) {
            UsageScope::Thread
        } else {
            UsageScope::Process
        }
    }
}

impl Default for ProcessSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLING_PRECISION)
    }
}

impl MetricsCollectorSelector for ProcessSelector {
    fn create(
        &self,
        run_mode: RunMode,
        warmup: &WarmupData,
        setting: &MeasurementSetting,
    ) -> Vec<Collector> {
        let name = setting.metric.clone();
        let MetricName::Process(metric) = name else {
            return vec![Collector::empty(name)];
        };

        let collector = match metric {
            ProcessMetric::ReadBytes | ProcessMetric::WrittenBytes => {
                match ProcfsIoCollector::open(metric, &self.io_pool) {
                    Ok(source) => Collector::with_default_unit(name, source),
                    Err(e) => {
                        warn!(metric = %name, error = %e, "I/O accounting unavailable, metric will read zero");
                        Collector::empty(name)
                    }
                }
            }
            _ => match UsageCollector::open(metric, self.usage_scope(run_mode, warmup)) {
                Some(source) => Collector::with_default_unit(name, source),
                None => {
                    warn!(metric = %name, "resource usage unavailable, metric will read zero");
                    Collector::empty(name)
                }
            },
        };
        vec![collector]
    }

    fn lease(&self, setting: &MeasurementSetting) -> Option<ResourceLease> {
        match setting.metric {
            MetricName::Process(ProcessMetric::ReadBytes | ProcessMetric::WrittenBytes) => {
                let handle: ResourceLease = self.io_pool.acquire().ok()?;
                Some(handle)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SizeClass;

    #[test]
    fn test_default_registry_kinds() {
        let registry = SelectorRegistry::with_precision(DEFAULT_SAMPLING_PRECISION);
        assert!(registry.contains(MetricKind::Timing));
        assert!(registry.contains(MetricKind::Memory));
        assert!(registry.contains(MetricKind::Allocations));
        assert!(registry.contains(MetricKind::Process));
        assert!(!registry.contains(MetricKind::Counter));
    }

    #[test]
    fn test_all_size_classes_expand_to_three_collectors() {
        let setting = MeasurementSetting::measure(MetricName::Allocations(SizeClass::All));
        let collectors =
            AllocationSelector.create(RunMode::Iterations, &WarmupData::PRE_WARMUP, &setting);

        let names: Vec<_> = collectors.iter().map(|c| c.name().clone()).collect();
        assert_eq!(
            names,
            vec![
                MetricName::Allocations(SizeClass::Small),
                MetricName::Allocations(SizeClass::Medium),
                MetricName::Allocations(SizeClass::Large),
            ]
        );
    }

    #[test]
    fn test_elapsed_time_selector() {
        let setting = MeasurementSetting::measure(MetricName::Timing(TimingMetric::ElapsedTime));
        let collectors =
            TimingSelector.create(RunMode::Iterations, &WarmupData::PRE_WARMUP, &setting);

        assert_eq!(collectors.len(), 1);
        assert!(!collectors[0].is_empty());
        assert_eq!(collectors[0].unit(), "ms");
    }

    #[test]
    fn test_usage_scope_follows_sampling_strategy() {
        let selector = ProcessSelector::default();
        let fast = WarmupData::new(1_000, 1);

        assert_eq!(selector.usage_scope(RunMode::Iterations, &fast), UsageScope::Thread);
        assert_eq!(selector.usage_scope(RunMode::Throughput, &fast), UsageScope::Process);
        assert_eq!(
            selector.usage_scope(RunMode::Iterations, &WarmupData::PRE_WARMUP),
            UsageScope::Process
        );
    }

    #[test]
    fn test_missing_io_source_degrades_to_empty() {
        let pool = Arc::new(ProcfsIoPool::with_path("/definitely/not/here/io"));
        let selector = ProcessSelector::with_pool(DEFAULT_SAMPLING_PRECISION, pool);
        let setting = MeasurementSetting::measure(MetricName::Process(ProcessMetric::ReadBytes));

        let collectors = selector.create(RunMode::Iterations, &WarmupData::PRE_WARMUP, &setting);
        assert_eq!(collectors.len(), 1);
        assert!(collectors[0].is_empty());
        assert_eq!(
            collectors[0].name(),
            &MetricName::Process(ProcessMetric::ReadBytes)
        );
    }
}
