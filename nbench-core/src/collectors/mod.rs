//! Metric Collectors
//!
//! A collector is a stateful reader of one metric. Readings are cumulative:
//! only the difference between a trial's first and last reading is reported.
//!
//! Sources implement [`MetricCollector`]; the engine only ever handles them
//! wrapped in a [`Collector`], which adds the metric identity, the unit label,
//! the no-op sentinel for sources that could not be opened, and exactly-once
//! disposal.

mod counter;
mod memory;
mod process;
mod timing;

pub use counter::CounterCollector;
pub use memory::{AllocationCountCollector, SizeClassCollector, TotalBytesCollector};
pub use process::{ProcfsIoCollector, ProcfsIoPool, UsageCollector, UsageScope};
pub use timing::{CpuCyclesCollector, ElapsedTimeCollector};

use crate::metrics::MetricName;
use std::fmt;

/// A source of cumulative readings for one metric
pub trait MetricCollector: Send {
    /// Take a reading. Must be cheap and safe to call repeatedly.
    fn collect(&mut self) -> f64;

    /// Release any held resource. Called at most once by [`Collector`].
    fn dispose(&mut self) {}
}

enum CollectorState {
    /// Sentinel for a metric whose source is unavailable; always reads zero
    Empty,
    Live(Box<dyn MetricCollector>),
    Disposed,
}

/// A metric source together with its identity
pub struct Collector {
    name: MetricName,
    unit: String,
    state: CollectorState,
}

impl Collector {
    /// Wrap a live source
    pub fn new(name: MetricName, unit: impl Into<String>, source: impl MetricCollector + 'static) -> Self {
        Self {
            name,
            unit: unit.into(),
            state: CollectorState::Live(Box::new(source)),
        }
    }

    /// Wrap a live source using the metric's default unit
    pub fn with_default_unit(name: MetricName, source: impl MetricCollector + 'static) -> Self {
        let unit = name.unit();
        Self::new(name, unit, source)
    }

    /// The no-op collector for a metric that cannot be read on this system
    pub fn empty(name: MetricName) -> Self {
        let unit = name.unit().to_string();
        Self {
            name,
            unit,
            state: CollectorState::Empty,
        }
    }

    /// Metric this collector reads
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    /// Unit label
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Whether this is the no-op sentinel
    pub fn is_empty(&self) -> bool {
        matches!(self.state, CollectorState::Empty)
    }

    /// Whether the source has been released
    pub fn is_disposed(&self) -> bool {
        matches!(self.state, CollectorState::Disposed)
    }

    /// Take a reading; empty and disposed collectors read zero
    #[inline]
    pub fn collect(&mut self) -> f64 {
        match &mut self.state {
            CollectorState::Live(source) => source.collect(),
            CollectorState::Empty | CollectorState::Disposed => 0.0,
        }
    }

    /// Release the source. Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if let CollectorState::Live(_) = self.state {
            if let CollectorState::Live(mut source) =
                std::mem::replace(&mut self.state, CollectorState::Disposed)
            {
                source.dispose();
            }
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            CollectorState::Empty => "empty",
            CollectorState::Live(_) => "live",
            CollectorState::Disposed => "disposed",
        };
        f.debug_struct("Collector")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::MetricCollector;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed series of readings and counts disposals
    pub struct ScriptedCollector {
        values: Vec<f64>,
        next: usize,
        pub disposals: Arc<AtomicUsize>,
    }

    impl ScriptedCollector {
        pub fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                next: 0,
                disposals: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MetricCollector for ScriptedCollector {
        fn collect(&mut self) -> f64 {
            let value = self.values.get(self.next).copied().unwrap_or(0.0);
            self.next += 1;
            value
        }

        fn dispose(&mut self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }
}
