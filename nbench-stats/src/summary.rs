//! Summary Statistics
//!
//! Max, min, mean and sample standard deviation over a series of values.
//! Unlike a latency summary there is no outlier removal: each value is the
//! result of a whole trial, and every trial counts.

use serde::{Deserialize, Serialize};

/// Statistics over one series of per-trial values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkStat {
    /// Largest observed value
    pub max: f64,
    /// Smallest observed value
    pub min: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Number of values the statistics were computed from
    pub sample_count: usize,
}

impl BenchmarkStat {
    /// Compute statistics over `values`.
    ///
    /// Empty input yields all zeros; a single value has a standard deviation of zero.
    pub fn new(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;

        let std_dev = if values.len() < 2 {
            0.0
        } else {
            let variance =
                values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
            variance.sqrt()
        };

        let min = values
            .iter()
            .cloned()
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0.0);
        let max = values
            .iter()
            .cloned()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(0.0);

        Self {
            max,
            min,
            mean,
            std_dev,
            sample_count: values.len(),
        }
    }

    /// Coefficient of variation (relative stddev, in percent)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }

    /// Whether no values contributed to these statistics
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stat() {
        let stat = BenchmarkStat::new(&[1.0, 2.0, 3.0]);

        assert_eq!(stat.max, 3.0);
        assert_eq!(stat.min, 1.0);
        assert!((stat.mean - 2.0).abs() < f64::EPSILON);
        assert!((stat.std_dev - 1.0).abs() < f64::EPSILON);
        assert_eq!(stat.sample_count, 3);
    }

    #[test]
    fn test_empty_values() {
        let stat = BenchmarkStat::new(&[]);

        assert_eq!(stat.max, 0.0);
        assert_eq!(stat.min, 0.0);
        assert_eq!(stat.mean, 0.0);
        assert_eq!(stat.std_dev, 0.0);
        assert!(stat.is_empty());
    }

    #[test]
    fn test_single_zero() {
        let stat = BenchmarkStat::new(&[0.0]);

        assert_eq!(stat.max, 0.0);
        assert_eq!(stat.min, 0.0);
        assert_eq!(stat.mean, 0.0);
        assert_eq!(stat.std_dev, 0.0);
        assert_eq!(stat.sample_count, 1);
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let stat = BenchmarkStat::new(&[42.0]);
        assert_eq!(stat.std_dev, 0.0);
        assert_eq!(stat.mean, 42.0);
    }

    #[test]
    fn test_negative_values() {
        let stat = BenchmarkStat::new(&[-5.0, 5.0]);
        assert_eq!(stat.min, -5.0);
        assert_eq!(stat.max, 5.0);
        assert_eq!(stat.mean, 0.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        let stat = BenchmarkStat::new(&[100.0, 100.0, 100.0]);
        assert!((stat.coefficient_of_variation() - 0.0).abs() < f64::EPSILON);

        let zero = BenchmarkStat::default();
        assert_eq!(zero.coefficient_of_variation(), 0.0);
    }
}
