//! Benchmark Runs
//!
//! A run is the state of one trial: a bucket per collected metric plus the
//! context handed to user code. Runs are built fresh for every trial and
//! disposed once their report has been extracted.

use crate::bucket::MeasureBucket;
use crate::context::BenchmarkContext;
use crate::report::BenchmarkRunReport;

/// Buckets and context of a single trial
#[derive(Debug)]
pub struct BenchmarkRun {
    buckets: Vec<MeasureBucket>,
    context: BenchmarkContext,
    disposed: bool,
}

impl BenchmarkRun {
    pub(crate) fn new(buckets: Vec<MeasureBucket>, context: BenchmarkContext) -> Self {
        Self {
            buckets,
            context,
            disposed: false,
        }
    }

    /// Context handed to user code
    pub fn context(&self) -> &BenchmarkContext {
        &self.context
    }

    /// One bucket per collected metric
    pub fn buckets(&self) -> &[MeasureBucket] {
        &self.buckets
    }

    /// Split into the parts the sampler and the work thread borrow separately
    pub(crate) fn split(&mut self) -> (&mut [MeasureBucket], &BenchmarkContext) {
        (&mut self.buckets, &self.context)
    }

    /// Take one reading from every bucket
    #[inline]
    pub fn sample(&mut self, elapsed_nanos: u64) {
        sample_all(&mut self.buckets, elapsed_nanos);
    }

    /// Snapshot the buckets. `elapsed_nanos` is the trial body's wall-clock time.
    pub fn to_report(&self, elapsed_nanos: u64) -> BenchmarkRunReport {
        BenchmarkRunReport {
            benchmark: self.context.benchmark_name().to_string(),
            elapsed_nanos,
            metrics: self.buckets.iter().map(MeasureBucket::to_report).collect(),
            faults: Vec::new(),
        }
    }

    /// Dispose every bucket. Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for bucket in &mut self.buckets {
            bucket.dispose();
        }
    }

    /// Whether disposal has already happened
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for BenchmarkRun {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[inline]
pub(crate) fn sample_all(buckets: &mut [MeasureBucket], elapsed_nanos: u64) {
    for bucket in buckets {
        bucket.collect(elapsed_nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::Collector;
    use crate::collectors::testing::ScriptedCollector;
    use crate::context::CancellationToken;
    use crate::metrics::MetricName;
    use fxhash::FxHashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn run_with(sources: Vec<(&str, Vec<f64>)>) -> (BenchmarkRun, Vec<Arc<AtomicUsize>>) {
        let mut disposals = Vec::new();
        let buckets = sources
            .into_iter()
            .map(|(name, values)| {
                let source = ScriptedCollector::new(values);
                disposals.push(source.disposals.clone());
                MeasureBucket::new(Collector::new(MetricName::counter(name), "ops", source))
            })
            .collect();
        let context = BenchmarkContext::new("run", FxHashMap::default(), CancellationToken::new());
        (BenchmarkRun::new(buckets, context), disposals)
    }

    #[test]
    fn test_report_covers_every_bucket() {
        let (mut run, _) = run_with(vec![("a", vec![1.0, 4.0]), ("b", vec![0.0, 10.0])]);
        run.sample(0);
        run.sample(1_000);

        let report = run.to_report(1_000);
        assert_eq!(report.benchmark, "run");
        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metric(&MetricName::counter("a")).unwrap().value, 3.0);
        assert_eq!(report.metric(&MetricName::counter("b")).unwrap().value, 10.0);
    }

    #[test]
    fn test_dispose_releases_each_bucket_once() {
        let (mut run, disposals) = run_with(vec![("a", vec![]), ("b", vec![])]);
        run.dispose();
        run.dispose();
        drop(run);

        for d in disposals {
            assert_eq!(d.load(Ordering::SeqCst), 1);
        }
    }
}
