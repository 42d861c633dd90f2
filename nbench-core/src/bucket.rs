//! Measurement Buckets
//!
//! A bucket owns one collector and remembers the first and the most recent
//! reading of a trial. Intermediate readings from the background sampler only
//! move the second slot forward.

use crate::collectors::Collector;
use crate::metrics::MetricName;
use crate::report::MetricRunReport;

/// One timestamped reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Trial time at which the reading was taken
    pub elapsed_nanos: u64,
    /// Collector reading
    pub value: f64,
}

/// Two-point sample storage for one metric
#[derive(Debug)]
pub struct MeasureBucket {
    collector: Collector,
    first: Option<Sample>,
    last: Option<Sample>,
    readings: usize,
}

impl MeasureBucket {
    /// Empty bucket over `collector`
    pub fn new(collector: Collector) -> Self {
        Self {
            collector,
            first: None,
            last: None,
            readings: 0,
        }
    }

    /// Metric or benchmark name
    pub fn name(&self) -> &MetricName {
        self.collector.name()
    }

    /// Unit label
    pub fn unit(&self) -> &str {
        self.collector.unit()
    }

    /// Read the collector and stamp the reading with `elapsed_nanos`
    #[inline]
    pub fn collect(&mut self, elapsed_nanos: u64) {
        let sample = Sample {
            elapsed_nanos,
            value: self.collector.collect(),
        };
        if self.first.is_none() {
            self.first = Some(sample);
        }
        self.last = Some(sample);
        self.readings = (self.readings + 1).min(2);
    }

    /// Readings taken so far, capped at two
    pub fn sample_count(&self) -> usize {
        self.readings
    }

    /// Earliest reading of the trial
    pub fn first(&self) -> Option<Sample> {
        self.first
    }

    /// Latest reading of the trial
    pub fn last(&self) -> Option<Sample> {
        self.last
    }

    /// Difference between the last and first readings.
    ///
    /// With a single reading the delta is zero; with none, the duration is
    /// zero as well.
    pub fn to_report(&self) -> MetricRunReport {
        let (value, elapsed_nanos) = match (self.first, self.last) {
            (Some(first), Some(last)) => (last.value - first.value, last.elapsed_nanos.max(1)),
            _ => (0.0, 0),
        };
        MetricRunReport {
            name: self.name().clone(),
            unit: self.unit().to_string(),
            value,
            elapsed_nanos,
        }
    }

    /// Release the collector; idempotent
    pub fn dispose(&mut self) {
        self.collector.dispose();
    }

    /// Whether disposal has already happened
    pub fn is_disposed(&self) -> bool {
        self.collector.is_disposed()
    }
}
