//! Benchmark Context
//!
//! The view of a trial that user code receives: named counters and the
//! cooperative cancellation flag.

use fxhash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// A user-visible counter, incremented from benchmark code and sampled by a collector
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicI64>,
}

impl Counter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one
    #[inline]
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Add `amount`
    #[inline]
    pub fn increment_by(&self, amount: i64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    /// Subtract one
    #[inline]
    pub fn decrement(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current value
    #[inline]
    pub fn current(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Cooperative cancellation flag shared between a benchmark and whoever drives it
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-trial context handed to setup, run and cleanup
#[derive(Debug, Clone)]
pub struct BenchmarkContext {
    benchmark: String,
    counters: FxHashMap<String, Counter>,
    cancellation: CancellationToken,
}

impl BenchmarkContext {
    pub(crate) fn new(
        benchmark: impl Into<String>,
        counters: FxHashMap<String, Counter>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            benchmark: benchmark.into(),
            counters,
            cancellation,
        }
    }

    /// Name of the benchmark this trial belongs to
    pub fn benchmark_name(&self) -> &str {
        &self.benchmark
    }

    /// Counter declared under `name`, if the benchmark declared one
    pub fn counter(&self, name: &str) -> Option<&Counter> {
        self.counters.get(name)
    }

    /// Names of all declared counters
    pub fn counter_names(&self) -> impl Iterator<Item = &str> {
        self.counters.keys().map(String::as_str)
    }

    /// Whether the benchmark was asked to stop; long-running bodies may poll this
    pub fn is_cancellation_requested(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_clones_share_value() {
        let counter = Counter::new();
        let clone = counter.clone();

        counter.increment();
        clone.increment_by(4);
        clone.decrement();

        assert_eq!(counter.current(), 4);
    }

    #[test]
    fn test_context_lookup() {
        let mut counters = FxHashMap::default();
        counters.insert("ops".to_string(), Counter::new());
        let ctx = BenchmarkContext::new("bench", counters, CancellationToken::new());

        assert!(ctx.counter("ops").is_some());
        assert!(ctx.counter("missing").is_none());
        assert_eq!(ctx.counter_names().collect::<Vec<_>>(), vec!["ops"]);
        assert_eq!(ctx.benchmark_name(), "bench");
    }

    #[test]
    fn test_cancellation_visible_through_context() {
        let token = CancellationToken::new();
        let ctx = BenchmarkContext::new("bench", FxHashMap::default(), token.clone());

        assert!(!ctx.is_cancellation_requested());
        token.cancel();
        assert!(ctx.is_cancellation_requested());
    }
}
