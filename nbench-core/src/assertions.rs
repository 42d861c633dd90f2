//! Assertion evaluation against compiled results

use crate::results::BenchmarkResults;
use crate::settings::BenchmarkSettings;
use nbench_logic::{AssertionResult, evaluate_assertion};
use tracing::debug;

/// Evaluate every declared assertion.
///
/// Measure-only settings produce nothing and a setting declared twice is
/// evaluated once. A setting on `SizeClass::All` is evaluated once per
/// concrete size class. A metric no trial collected is tested against an
/// all-zero aggregate.
pub fn evaluate(settings: &BenchmarkSettings, results: &BenchmarkResults) -> Vec<AssertionResult> {
    let mut verdicts = Vec::new();
    let mut seen = Vec::new();
    for setting in settings.asserted_measurements() {
        if seen.contains(&setting) {
            continue;
        }
        seen.push(setting);
        for name in setting.metric.concrete() {
            let aggregate = results.metric_or_unobserved(&name);
            let actual = aggregate.mean_for(setting.assertion_type);
            if let Some(result) = evaluate_assertion(
                &name.to_string(),
                &aggregate.unit,
                &setting.assertion,
                setting.assertion_type,
                actual,
            ) {
                debug!(metric = %name, passed = result.passed, "{}", result.message);
                verdicts.push(result);
            }
        }
    }
    verdicts
}
