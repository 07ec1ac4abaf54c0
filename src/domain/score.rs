//! Trust score domain types.
//!
//! The aggregator folds the output stage's signals into one scalar in [0,1]
//! plus a breakdown that lets auditors reconstruct the value.

use serde::{Deserialize, Serialize};

/// One check's contribution to the trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// The contributing check.
    pub check_id: String,
    /// The signal as observed (or imputed).
    pub raw_signal: f64,
    /// Configured weight for this check.
    pub weight: f64,
    /// Weighted, direction-adjusted contribution, normalized by the summed
    /// weights. Contributions sum to the score value.
    pub contribution: f64,
}

/// A check whose signal was unavailable (Error/Timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSignal {
    /// The check whose signal was missing.
    pub check_id: String,
    /// True if the configured conservative default was imputed; false if the
    /// check was excluded and the denominator renormalized.
    pub imputed: bool,
}

/// Output of the trust score aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    /// Aggregate trust in [0,1].
    pub value: f64,
    /// Per-check breakdown; summing the contributions reconstructs `value`
    /// up to rounding.
    pub components: Vec<ScoreComponent>,
    /// Checks excluded or imputed because their signal was unavailable.
    pub missing_signals: Vec<MissingSignal>,
    /// True when every signal was missing and `value` is the configured
    /// floor rather than an aggregate.
    pub floor_fallback: bool,
}

impl TrustScore {
    /// A score pinned to the configured floor because no signal survived.
    pub fn floor(value: f64, missing_signals: Vec<MissingSignal>) -> Self {
        Self {
            value,
            components: Vec::new(),
            missing_signals,
            floor_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_score_shape() {
        let score = TrustScore::floor(
            0.1,
            vec![MissingSignal {
                check_id: "grounding".to_string(),
                imputed: false,
            }],
        );
        assert!(score.floor_fallback);
        assert!(score.components.is_empty());
        assert_eq!(score.value, 0.1);
    }

    #[test]
    fn test_score_round_trips_through_json() {
        let score = TrustScore {
            value: 0.62,
            components: vec![ScoreComponent {
                check_id: "relevance".to_string(),
                raw_signal: 0.62,
                weight: 1.5,
                contribution: 0.62,
            }],
            missing_signals: Vec::new(),
            floor_fallback: false,
        };
        let json = serde_json::to_string(&score).unwrap();
        let back: TrustScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, score);
    }
}
