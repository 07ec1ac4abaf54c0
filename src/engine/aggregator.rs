//! Trust score aggregator.
//!
//! Folds the output stage's signals into one scalar in [0,1]. Pure and total:
//! the same report and configuration always produce a bit-identical score.

use std::collections::HashMap;

use crate::config::{CheckConfig, Config, MissingPolicy, SignalDirection};
use crate::domain::{MissingSignal, ScoreComponent, StageKind, StageReport, TrustScore};

/// Aggregation parameters for one check.
#[derive(Debug, Clone)]
struct CheckWeight {
    weight: f64,
    direction: SignalDirection,
    missing_policy: MissingPolicy,
}

impl From<&CheckConfig> for CheckWeight {
    fn from(config: &CheckConfig) -> Self {
        Self {
            weight: config.weight,
            direction: config.direction,
            missing_policy: config.missing_policy,
        }
    }
}

/// Weighted-sum aggregator over the output stage's signals.
pub struct TrustAggregator {
    weights: HashMap<String, CheckWeight>,
    score_floor: f64,
}

impl TrustAggregator {
    /// Build from the loaded configuration (output-stage checks only).
    pub fn from_config(config: &Config) -> Self {
        let weights = config
            .checks_for(StageKind::Output)
            .into_iter()
            .map(|c| (c.id.clone(), CheckWeight::from(c)))
            .collect();
        Self {
            weights,
            score_floor: config.pipeline.score_floor,
        }
    }

    #[cfg(test)]
    pub fn for_tests(
        entries: Vec<(&str, f64, SignalDirection, MissingPolicy)>,
        score_floor: f64,
    ) -> Self {
        let weights = entries
            .into_iter()
            .map(|(id, weight, direction, missing_policy)| {
                (
                    id.to_string(),
                    CheckWeight {
                        weight,
                        direction,
                        missing_policy,
                    },
                )
            })
            .collect();
        Self {
            weights,
            score_floor,
        }
    }

    /// Aggregate the output report into a trust score.
    ///
    /// Contribution per available signal s: w*s for positive-direction
    /// checks, w*(1-s) for negative-direction ones, normalized by the summed
    /// weights so the stored components sum to the value. Missing signals
    /// (error/timeout) either impute a configured default or are excluded
    /// with the denominator renormalized, per check. If nothing survives,
    /// the value is the configured floor rather than an arithmetic NaN.
    pub fn aggregate(&self, report: &StageReport) -> TrustScore {
        let mut components = Vec::new();
        let mut missing_signals = Vec::new();
        let mut contribution_sum = 0.0;
        let mut weight_sum = 0.0;

        // Report order is configured order, so iteration is deterministic.
        for result in &report.results {
            let Some(cw) = self.weights.get(&result.check_id) else {
                tracing::debug!(check_id = %result.check_id, "No weight configured; skipping");
                continue;
            };

            let available = result.verdict.signal_available();
            let signal = if available { result.signal } else { None };

            let raw_signal = match signal {
                Some(s) => s,
                None => match cw.missing_policy {
                    MissingPolicy::Impute { default } => {
                        missing_signals.push(MissingSignal {
                            check_id: result.check_id.clone(),
                            imputed: true,
                        });
                        default
                    }
                    MissingPolicy::Exclude => {
                        missing_signals.push(MissingSignal {
                            check_id: result.check_id.clone(),
                            imputed: false,
                        });
                        continue;
                    }
                },
            };

            let adjusted = match cw.direction {
                SignalDirection::Positive => raw_signal,
                SignalDirection::Negative => 1.0 - raw_signal,
            };
            let contribution = cw.weight * adjusted;

            components.push(ScoreComponent {
                check_id: result.check_id.clone(),
                raw_signal,
                weight: cw.weight,
                contribution,
            });
            contribution_sum += contribution;
            weight_sum += cw.weight;
        }

        if weight_sum <= 0.0 {
            // Every signal missing-and-excluded, or only zero-weight checks.
            return TrustScore::floor(self.score_floor, missing_signals);
        }

        // Normalize each contribution by the final weight sum so the stored
        // breakdown sums back to the value.
        for component in &mut components {
            component.contribution /= weight_sum;
        }

        TrustScore {
            value: (contribution_sum / weight_sum).clamp(0.0, 1.0),
            components,
            missing_signals,
            floor_fallback: false,
        }
    }
}
