//! Heap collectors backed by the [`TrackingAllocator`](crate::TrackingAllocator) counters

use super::MetricCollector;
use crate::allocator::{allocation_totals, allocations_in};
use crate::metrics::SizeClass;

/// Bytes requested from the allocator
#[derive(Debug, Default)]
pub struct TotalBytesCollector;

impl MetricCollector for TotalBytesCollector {
    fn collect(&mut self) -> f64 {
        allocation_totals().0 as f64
    }
}

/// Allocation calls of any size
#[derive(Debug, Default)]
pub struct AllocationCountCollector;

impl MetricCollector for AllocationCountCollector {
    fn collect(&mut self) -> f64 {
        allocation_totals().1 as f64
    }
}

/// Allocation calls within one concrete size class
#[derive(Debug)]
pub struct SizeClassCollector {
    class: SizeClass,
}

impl SizeClassCollector {
    /// Count allocations in `class`
    pub fn new(class: SizeClass) -> Self {
        Self { class }
    }
}

impl MetricCollector for SizeClassCollector {
    fn collect(&mut self) -> f64 {
        allocations_in(self.class) as f64
    }
}
