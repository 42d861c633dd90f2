//! Metric Identity
//!
//! `MetricName` is the value-equality key for everything the engine measures.
//! The set of metric families is closed; user-defined counters carry their own name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Family a metric belongs to; selectors are registered per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricKind {
    /// User-incremented counters
    Counter,
    /// Allocation counts split by size class
    Allocations,
    /// Heap totals
    Memory,
    /// Wall-clock and cycle timing
    Timing,
    /// Operating-system resource usage
    Process,
}

/// Allocation size classes tracked by the [`TrackingAllocator`](crate::TrackingAllocator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeClass {
    /// Up to [`SMALL_ALLOCATION_LIMIT`](crate::SMALL_ALLOCATION_LIMIT) bytes
    Small,
    /// Up to [`MEDIUM_ALLOCATION_LIMIT`](crate::MEDIUM_ALLOCATION_LIMIT) bytes
    Medium,
    /// Anything larger
    Large,
    /// Every class; expands into one collector per concrete class
    All,
}

impl SizeClass {
    /// The concrete classes, in ascending size order
    pub const CONCRETE: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    /// Concrete classes this value stands for
    pub fn expand(self) -> Vec<SizeClass> {
        match self {
            SizeClass::All => Self::CONCRETE.to_vec(),
            class => vec![class],
        }
    }
}

/// Heap totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryMetric {
    /// Bytes requested from the allocator
    TotalBytesAllocated,
    /// Number of allocation calls
    AllocationCount,
}

/// Timing sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimingMetric {
    /// Wall-clock milliseconds
    ElapsedTime,
    /// Hardware cycle counter ticks
    CpuCycles,
}

/// Operating-system counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessMetric {
    /// Page faults served without I/O
    MinorFaults,
    /// Page faults that required I/O
    MajorFaults,
    /// Context switches the process gave up voluntarily
    VoluntaryContextSwitches,
    /// Context switches forced by the scheduler
    InvoluntaryContextSwitches,
    /// Bytes read from storage (`/proc/self/io`)
    ReadBytes,
    /// Bytes written to storage (`/proc/self/io`)
    WrittenBytes,
}

/// Identity of a measured metric
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "metric")]
pub enum MetricName {
    /// A user counter, addressed by name through the benchmark context
    Counter(String),
    /// Allocations within one size class
    Allocations(SizeClass),
    /// Heap totals
    Memory(MemoryMetric),
    /// Timing
    Timing(TimingMetric),
    /// Operating-system counters
    Process(ProcessMetric),
}

impl MetricName {
    /// Shorthand for a counter name
    pub fn counter(name: impl Into<String>) -> Self {
        MetricName::Counter(name.into())
    }

    /// Family this metric belongs to
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::Counter(_) => MetricKind::Counter,
            MetricName::Allocations(_) => MetricKind::Allocations,
            MetricName::Memory(_) => MetricKind::Memory,
            MetricName::Timing(_) => MetricKind::Timing,
            MetricName::Process(_) => MetricKind::Process,
        }
    }

    /// Whether this is a user counter
    pub fn is_counter(&self) -> bool {
        matches!(self, MetricName::Counter(_))
    }

    /// Concrete metrics this name is collected as.
    ///
    /// Only `Allocations(SizeClass::All)` expands to more than one name.
    pub fn concrete(&self) -> Vec<MetricName> {
        match self {
            MetricName::Allocations(class) => class
                .expand()
                .into_iter()
                .map(MetricName::Allocations)
                .collect(),
            other => vec![other.clone()],
        }
    }

    /// Unit label reported next to values of this metric
    pub fn unit(&self) -> &'static str {
        match self {
            MetricName::Counter(_) => "operations",
            MetricName::Allocations(_) => "allocations",
            MetricName::Memory(MemoryMetric::TotalBytesAllocated) => "bytes",
            MetricName::Memory(MemoryMetric::AllocationCount) => "allocations",
            MetricName::Timing(TimingMetric::ElapsedTime) => "ms",
            MetricName::Timing(TimingMetric::CpuCycles) => "cycles",
            MetricName::Process(ProcessMetric::MinorFaults | ProcessMetric::MajorFaults) => {
                "faults"
            }
            MetricName::Process(
                ProcessMetric::VoluntaryContextSwitches | ProcessMetric::InvoluntaryContextSwitches,
            ) => "switches",
            MetricName::Process(ProcessMetric::ReadBytes | ProcessMetric::WrittenBytes) => "bytes",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricName::Counter(name) => write!(f, "[Counter] {name}"),
            MetricName::Allocations(class) => write!(f, "[Allocations] {class:?}"),
            MetricName::Memory(metric) => write!(f, "{metric:?}"),
            MetricName::Timing(TimingMetric::ElapsedTime) => f.write_str("Elapsed Time"),
            MetricName::Timing(TimingMetric::CpuCycles) => f.write_str("CPU Cycles"),
            MetricName::Process(metric) => write!(f, "[Process] {metric:?}"),
        }
    }
}
