//! Signal parsing and health classification

use crate::error::SealError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Ceiling at or below which a signal is classified `Optimal`
pub const DEFAULT_SIGNAL_CEILING: f64 = 92.6;

/// Derived health classification of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Signal at or below the ceiling
    Optimal,
    /// Signal above the ceiling
    Stress,
}

impl HealthStatus {
    /// Check if the status is `Optimal`
    #[inline]
    #[must_use]
    pub fn is_optimal(self) -> bool {
        matches!(self, Self::Optimal)
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => f.write_str("Optimal"),
            Self::Stress => f.write_str("Stress"),
        }
    }
}

/// Threshold rule: `Optimal` when `value <= ceiling`, `Stress` otherwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthRule {
    ceiling: f64,
}

impl HealthRule {
    /// Create a rule with the given ceiling
    #[inline]
    #[must_use]
    pub const fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }

    /// Configured ceiling
    #[inline]
    #[must_use]
    pub const fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Classify a parsed signal
    #[inline]
    #[must_use]
    pub fn classify(&self, value: f64) -> HealthStatus {
        if value <= self.ceiling {
            HealthStatus::Optimal
        } else {
            HealthStatus::Stress
        }
    }
}

impl Default for HealthRule {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_CEILING)
    }
}

/// Parse a raw signal string
///
/// Surrounding whitespace is ignored. `NaN` and infinities are rejected even
/// though `f64` can represent them.
///
/// # Errors
/// `SealError::InvalidSignal` if the input is not a finite number
pub fn parse_signal(input: &str) -> Result<f64, SealError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SealError::InvalidSignal {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_inclusive() {
        let rule = HealthRule::new(92.6);
        assert_eq!(rule.classify(92.6), HealthStatus::Optimal);
        assert_eq!(rule.classify(95.0), HealthStatus::Stress);
        assert_eq!(rule.classify(-3.0), HealthStatus::Optimal);
    }

    #[test]
    fn default_rule_uses_named_ceiling() {
        assert_eq!(HealthRule::default().ceiling(), DEFAULT_SIGNAL_CEILING);
    }

    #[test]
    fn parse_accepts_padded_numbers() {
        assert_eq!(parse_signal(" 92.6 ").unwrap(), 92.6);
        assert_eq!(parse_signal("95").unwrap(), 95.0);
        assert_eq!(parse_signal("1e2").unwrap(), 100.0);
    }

    #[test]
    fn parse_rejects_garbage_and_non_finite() {
        for input in ["abc", "", "  ", "92.6%", "NaN", "inf", "-infinity"] {
            let err = parse_signal(input).unwrap_err();
            assert!(
                matches!(err, SealError::InvalidSignal { .. }),
                "{input:?} should be rejected"
            );
        }
    }
}
