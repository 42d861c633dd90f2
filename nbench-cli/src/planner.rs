//! Benchmark Planner
//!
//! Selects which catalog entries run. A regex filter is matched against the
//! benchmark name; entries keep their registration order.

use nbench_core::{BenchmarkCatalog, CatalogEntry};
use regex::Regex;

/// Execution plan for benchmarks
pub struct ExecutionPlan<'a> {
    /// Entries to run, in order
    pub benchmarks: Vec<&'a CatalogEntry>,
}

impl ExecutionPlan<'_> {
    /// Whether no benchmark matched
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Number of benchmarks to run
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }
}

/// Build execution plan from registered benchmarks
pub fn build_plan<'a>(catalog: &'a BenchmarkCatalog, filter: Option<&Regex>) -> ExecutionPlan<'a> {
    let benchmarks = catalog
        .iter()
        .filter(|entry| filter.is_none_or(|re| re.is_match(entry.name())))
        .collect();

    ExecutionPlan { benchmarks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbench_core::BenchmarkMethods;

    fn catalog() -> BenchmarkCatalog {
        let mut catalog = BenchmarkCatalog::new();
        for name in ["parse_small", "parse_large", "encode"] {
            catalog
                .register(name, |b| b.counter("ops"), || BenchmarkMethods::new(|_| {}))
                .unwrap();
        }
        catalog
    }

    #[test]
    fn test_no_filter_keeps_registration_order() {
        let catalog = catalog();
        let plan = build_plan(&catalog, None);
        let names: Vec<_> = plan.benchmarks.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["parse_small", "parse_large", "encode"]);
    }

    #[test]
    fn test_regex_filter() {
        let catalog = catalog();
        let re = Regex::new("^parse_").unwrap();
        let plan = build_plan(&catalog, Some(&re));
        assert_eq!(plan.len(), 2);
        assert!(plan.benchmarks.iter().all(|e| e.name().starts_with("parse_")));
    }

    #[test]
    fn test_filter_matching_nothing() {
        let catalog = catalog();
        let re = Regex::new("nomatch").unwrap();
        assert!(build_plan(&catalog, Some(&re)).is_empty());
    }
}
