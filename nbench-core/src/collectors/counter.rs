use super::MetricCollector;
use crate::context::Counter;

/// Reads a user [`Counter`]
pub struct CounterCollector {
    counter: Counter,
}

impl CounterCollector {
    /// Read `counter`
    pub fn new(counter: Counter) -> Self {
        Self { counter }
    }
}

impl MetricCollector for CounterCollector {
    #[inline]
    fn collect(&mut self) -> f64 {
        self.counter.current() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_counter() {
        let counter = Counter::new();
        let mut collector = CounterCollector::new(counter.clone());

        assert_eq!(collector.collect(), 0.0);
        counter.increment_by(3);
        assert_eq!(collector.collect(), 3.0);
    }
}
