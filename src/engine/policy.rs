//! Decision policy engine.
//!
//! A small rule engine: an ordered list of (predicate, outcome) pairs
//! evaluated top-down, first match wins. Rule order and precedence are
//! independently testable; the hard-safety override always sits first and
//! ignores the score entirely. Pure function, no hidden state.

use crate::config::ThresholdConfig;
use crate::domain::{Decision, DecisionLabel, StageReport, TrustScore};
use crate::error::GateResult;

/// Everything a rule may branch on.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext {
    pub score: f64,
    pub input_blocked: bool,
    pub output_blocked: bool,
    /// Whether any evidence exists for the response.
    pub has_evidence: bool,
}

/// One policy rule. `applies` gates the rule; `outcome` produces the label
/// and message key once it fires.
struct PolicyRule {
    name: &'static str,
    applies: fn(&DecisionContext, &ThresholdConfig) -> bool,
    outcome: fn(&DecisionContext) -> (DecisionLabel, Option<&'static str>),
}

/// The ordered rule table. First match wins; the final rule is a catch-all,
/// so evaluation is total.
const RULES: &[PolicyRule] = &[
    PolicyRule {
        name: "hard_safety_override",
        applies: |ctx, _| ctx.input_blocked || ctx.output_blocked,
        outcome: |_| (DecisionLabel::Block, Some("blocked_unsafe")),
    },
    PolicyRule {
        name: "high_confidence",
        applies: |ctx, t| ctx.score >= t.high_confidence,
        outcome: |_| (DecisionLabel::Accept, None),
    },
    PolicyRule {
        name: "medium_confidence",
        applies: |ctx, t| ctx.score >= t.medium_confidence,
        outcome: |ctx| {
            if ctx.has_evidence {
                (DecisionLabel::CitationsOnly, Some("citations_required"))
            } else {
                (DecisionLabel::Clarify, Some("needs_clarification"))
            }
        },
    },
    PolicyRule {
        name: "low_confidence",
        applies: |ctx, t| ctx.score >= t.low_confidence,
        outcome: |_| (DecisionLabel::Clarify, Some("needs_clarification")),
    },
    PolicyRule {
        name: "insufficient_trust",
        applies: |_, _| true,
        outcome: |_| (DecisionLabel::Block, Some("blocked_low_trust")),
    },
];

/// Maps (trust score, stage reports) to a terminal decision.
pub struct DecisionPolicy {
    thresholds: ThresholdConfig,
}

impl DecisionPolicy {
    /// Thresholds are re-validated here so the engine cannot exist in an
    /// inconsistent state even when constructed outside config loading.
    pub fn new(thresholds: ThresholdConfig) -> GateResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    /// Decide from the full pipeline artifacts.
    pub fn decide(
        &self,
        score: &TrustScore,
        input_report: &StageReport,
        output_report: &StageReport,
        has_evidence: bool,
    ) -> Decision {
        self.decide_context(&DecisionContext {
            score: score.value,
            input_blocked: input_report.blocked,
            output_blocked: output_report.blocked,
            has_evidence,
        })
    }

    /// Core rule evaluation, exposed for property tests.
    pub fn decide_context(&self, ctx: &DecisionContext) -> Decision {
        for rule in RULES {
            if (rule.applies)(ctx, &self.thresholds) {
                let (label, message_key) = (rule.outcome)(ctx);
                tracing::debug!(
                    rule = rule.name,
                    label = %label,
                    score = ctx.score,
                    "Policy rule fired"
                );
                return Decision::new(label, rule.name, message_key);
            }
        }
        // The catch-all rule makes this unreachable.
        unreachable!("policy rule table has no catch-all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            low_confidence: 0.40,
            medium_confidence: 0.55,
            high_confidence: 0.75,
        }
    }

    fn policy() -> DecisionPolicy {
        DecisionPolicy::new(thresholds()).unwrap()
    }

    fn ctx(score: f64, has_evidence: bool) -> DecisionContext {
        DecisionContext {
            score,
            input_blocked: false,
            output_blocked: false,
            has_evidence,
        }
    }

    #[test]
    fn test_invalid_thresholds_rejected_at_construction() {
        let bad = ThresholdConfig {
            low_confidence: 0.8,
            medium_confidence: 0.5,
            high_confidence: 0.9,
        };
        assert!(matches!(
            DecisionPolicy::new(bad),
            Err(GateError::Config(_))
        ));
    }

    #[test]
    fn test_high_score_accepts() {
        let decision = policy().decide_context(&ctx(0.80, true));
        assert_eq!(decision.label, DecisionLabel::Accept);
        assert_eq!(decision.rule, "high_confidence");
    }

    #[test]
    fn test_medium_score_with_evidence_is_citations_only() {
        let decision = policy().decide_context(&ctx(0.60, true));
        assert_eq!(decision.label, DecisionLabel::CitationsOnly);
        assert_eq!(decision.rule, "medium_confidence");
    }

    #[test]
    fn test_medium_score_without_evidence_is_clarify() {
        let decision = policy().decide_context(&ctx(0.60, false));
        assert_eq!(decision.label, DecisionLabel::Clarify);
    }

    #[test]
    fn test_low_score_is_clarify() {
        let decision = policy().decide_context(&ctx(0.45, true));
        assert_eq!(decision.label, DecisionLabel::Clarify);
        assert_eq!(decision.rule, "low_confidence");
    }

    #[test]
    fn test_very_low_score_is_block() {
        let decision = policy().decide_context(&ctx(0.30, true));
        assert_eq!(decision.label, DecisionLabel::Block);
        assert_eq!(decision.rule, "insufficient_trust");
    }

    #[test]
    fn test_block_flag_overrides_any_score() {
        for score in [0.0, 0.5, 0.99, 1.0] {
            let decision = policy().decide_context(&DecisionContext {
                score,
                input_blocked: true,
                output_blocked: false,
                has_evidence: true,
            });
            assert_eq!(decision.label, DecisionLabel::Block);
            assert_eq!(decision.rule, "hard_safety_override");
        }
    }

    #[test]
    fn test_output_block_also_overrides() {
        let decision = policy().decide_context(&DecisionContext {
            score: 0.95,
            input_blocked: false,
            output_blocked: true,
            has_evidence: true,
        });
        assert_eq!(decision.label, DecisionLabel::Block);
    }

    #[test]
    fn test_exact_threshold_values_are_inclusive() {
        assert_eq!(
            policy().decide_context(&ctx(0.75, true)).label,
            DecisionLabel::Accept
        );
        assert_eq!(
            policy().decide_context(&ctx(0.55, true)).label,
            DecisionLabel::CitationsOnly
        );
        assert_eq!(
            policy().decide_context(&ctx(0.40, true)).label,
            DecisionLabel::Clarify
        );
    }

    #[test]
    fn test_deterministic_and_total_over_score_grid() {
        let policy = policy();
        for i in 0..=100 {
            let score = i as f64 / 100.0;
            let first = policy.decide_context(&ctx(score, true));
            let second = policy.decide_context(&ctx(score, true));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_monotonic_confidence_tiers() {
        // With blocked=false fixed, a higher score never yields a lower tier.
        let policy = policy();
        for has_evidence in [false, true] {
            let mut last_tier = 0;
            for i in 0..=1000 {
                let score = i as f64 / 1000.0;
                let tier = policy.decide_context(&ctx(score, has_evidence)).label.tier();
                assert!(
                    tier >= last_tier,
                    "tier regressed at score {} (evidence={})",
                    score,
                    has_evidence
                );
                last_tier = tier;
            }
        }
    }

    #[test]
    fn test_equal_thresholds_are_valid() {
        let policy = DecisionPolicy::new(ThresholdConfig {
            low_confidence: 0.5,
            medium_confidence: 0.5,
            high_confidence: 0.5,
        })
        .unwrap();
        // At the shared boundary the highest-precedence rule wins.
        assert_eq!(
            policy.decide_context(&ctx(0.5, true)).label,
            DecisionLabel::Accept
        );
        assert_eq!(
            policy.decide_context(&ctx(0.49, true)).label,
            DecisionLabel::Block
        );
    }
}
