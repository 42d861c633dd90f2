//! Assertion Conditions
//!
//! An assertion is either the measure-only sentinel or a condition with its
//! threshold(s). Conditions form a closed set so evaluation is an exhaustive match.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while constructing an assertion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssertionError {
    /// `Between` was requested without its upper bound
    #[error("a `between` assertion requires an upper bound")]
    MissingUpperBound,

    /// `Between` bounds were given in the wrong order
    #[error("invalid `between` bounds: lower {lower} is greater than upper {upper}")]
    InvertedBounds {
        /// Lower bound as given
        lower: f64,
        /// Upper bound as given
        upper: f64,
    },

    /// A threshold was NaN or infinite
    #[error("assertion threshold must be finite, got {0}")]
    NonFinite(f64),
}

/// Which aggregate an assertion is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionType {
    /// Mean of the raw per-trial totals
    #[default]
    Total,
    /// Mean of the per-second normalized values
    Throughput,
}

/// Comparison operator without its thresholds, as declared by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `==`
    Equal,
    /// Inclusive range
    Between,
}

/// A comparison together with its threshold(s)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// value < threshold
    LessThan {
        /// Threshold
        value: f64,
    },
    /// value <= threshold
    LessThanOrEqual {
        /// Threshold
        value: f64,
    },
    /// value > threshold
    GreaterThan {
        /// Threshold
        value: f64,
    },
    /// value >= threshold
    GreaterThanOrEqual {
        /// Threshold
        value: f64,
    },
    /// value == threshold
    Equal {
        /// Threshold
        value: f64,
    },
    /// lower <= value <= upper
    Between {
        /// Inclusive lower bound
        lower: f64,
        /// Inclusive upper bound
        upper: f64,
    },
}

impl Condition {
    /// Test `actual` against this condition
    pub fn test(&self, actual: f64) -> bool {
        match *self {
            Condition::LessThan { value } => actual < value,
            Condition::LessThanOrEqual { value } => actual <= value,
            Condition::GreaterThan { value } => actual > value,
            Condition::GreaterThanOrEqual { value } => actual >= value,
            Condition::Equal { value } => actual == value,
            Condition::Between { lower, upper } => lower <= actual && actual <= upper,
        }
    }

    /// The declared operator
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::LessThan { .. } => ConditionKind::LessThan,
            Condition::LessThanOrEqual { .. } => ConditionKind::LessThanOrEqual,
            Condition::GreaterThan { .. } => ConditionKind::GreaterThan,
            Condition::GreaterThanOrEqual { .. } => ConditionKind::GreaterThanOrEqual,
            Condition::Equal { .. } => ConditionKind::Equal,
            Condition::Between { .. } => ConditionKind::Between,
        }
    }

    /// Primary threshold (the lower bound for `Between`)
    pub fn threshold(&self) -> f64 {
        match *self {
            Condition::LessThan { value }
            | Condition::LessThanOrEqual { value }
            | Condition::GreaterThan { value }
            | Condition::GreaterThanOrEqual { value }
            | Condition::Equal { value } => value,
            Condition::Between { lower, .. } => lower,
        }
    }

    /// Upper bound, only present for `Between`
    pub fn upper_bound(&self) -> Option<f64> {
        match *self {
            Condition::Between { upper, .. } => Some(upper),
            _ => None,
        }
    }
}

impl ConditionKind {
    /// Phrase used in assertion messages
    pub fn phrase(&self) -> &'static str {
        match self {
            ConditionKind::LessThan => "must be less than",
            ConditionKind::LessThanOrEqual => "must be less than or equal to",
            ConditionKind::GreaterThan => "must be greater than",
            ConditionKind::GreaterThanOrEqual => "must be greater than or equal to",
            ConditionKind::Equal => "must be exactly",
            ConditionKind::Between => "must be between",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

/// A user-declared expectation on one metric
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Measure-only: nothing is asserted and the check always passes
    #[default]
    Empty,
    /// Test the aggregate against a condition
    Check {
        /// The condition to test
        condition: Condition,
    },
}

impl Assertion {
    /// Build an assertion from a declared operator and its thresholds.
    ///
    /// `upper` is required for [`ConditionKind::Between`] and ignored otherwise.
    pub fn new(kind: ConditionKind, value: f64, upper: Option<f64>) -> Result<Self, AssertionError> {
        if !value.is_finite() {
            return Err(AssertionError::NonFinite(value));
        }

        let condition = match kind {
            ConditionKind::LessThan => Condition::LessThan { value },
            ConditionKind::LessThanOrEqual => Condition::LessThanOrEqual { value },
            ConditionKind::GreaterThan => Condition::GreaterThan { value },
            ConditionKind::GreaterThanOrEqual => Condition::GreaterThanOrEqual { value },
            ConditionKind::Equal => Condition::Equal { value },
            ConditionKind::Between => {
                let upper = upper.ok_or(AssertionError::MissingUpperBound)?;
                if !upper.is_finite() {
                    return Err(AssertionError::NonFinite(upper));
                }
                if value > upper {
                    return Err(AssertionError::InvertedBounds {
                        lower: value,
                        upper,
                    });
                }
                Condition::Between {
                    lower: value,
                    upper,
                }
            }
        };

        Ok(Assertion::Check { condition })
    }

    /// `actual < value`
    pub fn less_than(value: f64) -> Self {
        Assertion::Check {
            condition: Condition::LessThan { value },
        }
    }

    /// `actual <= value`
    pub fn less_than_or_equal(value: f64) -> Self {
        Assertion::Check {
            condition: Condition::LessThanOrEqual { value },
        }
    }

    /// `actual > value`
    pub fn greater_than(value: f64) -> Self {
        Assertion::Check {
            condition: Condition::GreaterThan { value },
        }
    }

    /// `actual >= value`
    pub fn greater_than_or_equal(value: f64) -> Self {
        Assertion::Check {
            condition: Condition::GreaterThanOrEqual { value },
        }
    }

    /// `actual == value`
    pub fn exactly(value: f64) -> Self {
        Assertion::Check {
            condition: Condition::Equal { value },
        }
    }

    /// `lower <= actual <= upper`
    pub fn between(lower: f64, upper: f64) -> Result<Self, AssertionError> {
        Self::new(ConditionKind::Between, lower, Some(upper))
    }

    /// Whether this is the measure-only sentinel
    pub fn is_empty(&self) -> bool {
        matches!(self, Assertion::Empty)
    }

    /// The condition, if anything is asserted
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Assertion::Empty => None,
            Assertion::Check { condition } => Some(condition),
        }
    }

    /// Test `actual`; the measure-only sentinel always passes
    pub fn test(&self, actual: f64) -> bool {
        match self {
            Assertion::Empty => true,
            Assertion::Check { condition } => condition.test(actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_requires_upper_bound() {
        assert_eq!(
            Assertion::new(ConditionKind::Between, 1.0, None),
            Err(AssertionError::MissingUpperBound)
        );
    }

    #[test]
    fn test_between_rejects_inverted_bounds() {
        assert!(matches!(
            Assertion::between(10.0, 1.0),
            Err(AssertionError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_between_is_inclusive() {
        let assertion = Assertion::between(10.0, 20.0).unwrap();

        assert!(assertion.test(10.0));
        assert!(assertion.test(20.0));
        assert!(assertion.test(15.0));
        assert!(!assertion.test(10.0 - 1e-9));
        assert!(!assertion.test(20.0 + 1e-9));
        assert!(!assertion.test(f64::NAN));
    }

    #[test]
    fn test_degenerate_between() {
        let assertion = Assertion::between(5.0, 5.0).unwrap();
        assert!(assertion.test(5.0));
        assert!(!assertion.test(5.000_001));
    }

    #[test]
    fn test_comparisons() {
        assert!(Assertion::less_than(5.0).test(4.9));
        assert!(!Assertion::less_than(5.0).test(5.0));
        assert!(Assertion::less_than_or_equal(5.0).test(5.0));
        assert!(Assertion::greater_than(5.0).test(5.1));
        assert!(!Assertion::greater_than(5.0).test(5.0));
        assert!(Assertion::greater_than_or_equal(5.0).test(5.0));
        assert!(Assertion::exactly(5.0).test(5.0));
        assert!(!Assertion::exactly(5.0).test(5.000_1));
    }

    #[test]
    fn test_empty_always_passes() {
        let assertion = Assertion::Empty;
        assert!(assertion.is_empty());
        assert!(assertion.test(f64::MAX));
        assert!(assertion.test(-1.0));
        assert!(assertion.condition().is_none());
    }

    #[test]
    fn test_non_finite_threshold() {
        assert_eq!(
            Assertion::new(ConditionKind::GreaterThan, f64::INFINITY, None),
            Err(AssertionError::NonFinite(f64::INFINITY))
        );
    }

    #[test]
    fn test_condition_accessors() {
        let assertion = Assertion::between(1.0, 2.0).unwrap();
        let condition = assertion.condition().unwrap();
        assert_eq!(condition.kind(), ConditionKind::Between);
        assert_eq!(condition.threshold(), 1.0);
        assert_eq!(condition.upper_bound(), Some(2.0));
        assert_eq!(Condition::Equal { value: 3.0 }.upper_bound(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let assertion = Assertion::between(1.0, 2.0).unwrap();
        let json = serde_json::to_string(&assertion).unwrap();
        let back: Assertion = serde_json::from_str(&json).unwrap();
        assert_eq!(assertion, back);
    }
}
