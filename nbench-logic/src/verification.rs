//! Assertion Evaluation
//!
//! Tests an assertion against a single aggregated scalar and renders the verdict.

use crate::format::{format_value, parse_value};
use crate::{Assertion, AssertionType};
use serde::{Deserialize, Serialize};

const PASS_TAG: &str = "[PASS]";
const FAIL_TAG: &str = "[FAIL]";
const ACTUAL_MARKER: &str = "actual value was ";

/// Verdict of one assertion against one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Display name of the metric the assertion targeted
    pub metric: String,
    /// Whether the condition held
    pub passed: bool,
    /// Human-readable verdict
    pub message: String,
    /// The scalar the condition was tested against
    pub actual_value: f64,
    /// Which aggregate was used
    pub assertion_type: AssertionType,
}

impl AssertionResult {
    /// Recover the pass/fail flag from a rendered message
    pub fn passed_from_message(message: &str) -> Option<bool> {
        if message.starts_with(PASS_TAG) {
            Some(true)
        } else if message.starts_with(FAIL_TAG) {
            Some(false)
        } else {
            None
        }
    }

    /// Recover the (rounded) actual value from a rendered message
    pub fn actual_from_message(message: &str) -> Option<f64> {
        let (_, tail) = message.split_once(ACTUAL_MARKER)?;
        let number = tail.split_whitespace().next()?;
        parse_value(number.trim_end_matches('.'))
    }
}

/// Evaluate `assertion` against `actual`.
///
/// Returns `None` for the measure-only sentinel: nothing was asserted, so there is
/// no verdict to report.
pub fn evaluate_assertion(
    metric: &str,
    unit: &str,
    assertion: &Assertion,
    assertion_type: AssertionType,
    actual: f64,
) -> Option<AssertionResult> {
    let condition = assertion.condition()?;
    let passed = condition.test(actual);

    let unit = match assertion_type {
        AssertionType::Total => unit.to_string(),
        AssertionType::Throughput => format!("{unit}/s"),
    };

    let bounds = match condition.upper_bound() {
        Some(upper) => format!(
            "{} and {}",
            format_value(condition.threshold()),
            format_value(upper)
        ),
        None => format_value(condition.threshold()),
    };

    let message = format!(
        "{} Expected {} {} {} {}; {}{} {}.",
        if passed { PASS_TAG } else { FAIL_TAG },
        metric,
        condition.kind().phrase(),
        bounds,
        unit,
        ACTUAL_MARKER,
        format_value(actual),
        unit
    );

    Some(AssertionResult {
        metric: metric.to_string(),
        passed,
        message,
        actual_value: actual,
        assertion_type,
    })
}

/// Summary of assertion verdicts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Number passed
    pub passed: usize,
    /// Number failed
    pub failed: usize,
}

impl AssertionSummary {
    /// Whether every evaluated assertion held
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Total assertions evaluated
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Count passes and failures
pub fn aggregate_assertions(results: &[AssertionResult]) -> AssertionSummary {
    let mut summary = AssertionSummary::default();

    for result in results {
        if result.passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format() {
        let result = evaluate_assertion(
            "[Counter] Ops",
            "operations",
            &Assertion::greater_than(1_000_000.0),
            AssertionType::Throughput,
            1_500_000.0,
        )
        .unwrap();

        assert!(result.passed);
        assert_eq!(
            result.message,
            "[PASS] Expected [Counter] Ops must be greater than 1,000,000.00 operations/s; \
             actual value was 1,500,000.00 operations/s."
        );
    }

    #[test]
    fn test_between_message() {
        let result = evaluate_assertion(
            "TotalBytesAllocated",
            "bytes",
            &Assertion::between(10.0, 20.0).unwrap(),
            AssertionType::Total,
            25.0,
        )
        .unwrap();

        assert!(!result.passed);
        assert_eq!(
            result.message,
            "[FAIL] Expected TotalBytesAllocated must be between 10.00 and 20.00 bytes; \
             actual value was 25.00 bytes."
        );
    }

    #[test]
    fn test_empty_assertion_has_no_verdict() {
        let result = evaluate_assertion("x", "ms", &Assertion::Empty, AssertionType::Total, 1.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_message_round_trip() {
        let assertion = Assertion::less_than_or_equal(100.0);
        for actual in [0.0, 99.5, 100.0, 100.5, 12_345.0] {
            let result =
                evaluate_assertion("m", "ms", &assertion, AssertionType::Total, actual).unwrap();

            assert_eq!(
                AssertionResult::passed_from_message(&result.message),
                Some(assertion.test(actual))
            );

            let reparsed = AssertionResult::actual_from_message(&result.message).unwrap();
            assert_eq!(assertion.test(reparsed), result.passed);
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let result = evaluate_assertion(
            "m",
            "ms",
            &Assertion::exactly(3.0),
            AssertionType::Total,
            3.0,
        )
        .unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let back: AssertionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.passed, Assertion::exactly(3.0).test(3.0));
    }

    #[test]
    fn test_aggregate_assertions() {
        let pass = evaluate_assertion("a", "u", &Assertion::less_than(1.0), AssertionType::Total, 0.0)
            .unwrap();
        let fail = evaluate_assertion("b", "u", &Assertion::less_than(1.0), AssertionType::Total, 2.0)
            .unwrap();

        let summary = aggregate_assertions(&[pass.clone(), fail, pass]);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.all_passed());
        assert!(aggregate_assertions(&[]).all_passed());
    }
}
