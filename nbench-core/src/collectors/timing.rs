use super::MetricCollector;
use crate::measure::{RunClock, read_cycles};

/// Wall-clock milliseconds since the collector was created
#[derive(Debug)]
pub struct ElapsedTimeCollector {
    clock: RunClock,
}

impl ElapsedTimeCollector {
    /// Milliseconds since now
    pub fn new() -> Self {
        Self {
            clock: RunClock::start(),
        }
    }
}

impl Default for ElapsedTimeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricCollector for ElapsedTimeCollector {
    #[inline]
    fn collect(&mut self) -> f64 {
        self.clock.elapsed_nanos() as f64 / 1_000_000.0
    }
}

/// Cycle counter ticks since the collector was created.
///
/// Readings are relative to creation so the f64 conversion keeps full precision.
#[derive(Debug)]
pub struct CpuCyclesCollector {
    origin: u64,
}

impl CpuCyclesCollector {
    /// Cycles since now
    pub fn new() -> Self {
        Self {
            origin: read_cycles(),
        }
    }
}

impl Default for CpuCyclesCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricCollector for CpuCyclesCollector {
    #[inline]
    fn collect(&mut self) -> f64 {
        read_cycles().saturating_sub(self.origin) as f64
    }
}
