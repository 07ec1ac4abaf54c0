//! Decision domain types.
//!
//! The policy engine's terminal output. A decision is consumed by the caller
//! and never fed back into the pipeline.

use serde::{Deserialize, Serialize};

/// Closed set of release decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionLabel {
    /// Release the response as-is.
    Accept,
    /// Ask the user to rephrase or narrow the query.
    Clarify,
    /// Release only alongside supporting evidence references.
    CitationsOnly,
    /// Withhold the response entirely.
    Block,
}

impl DecisionLabel {
    /// Confidence tier for monotonicity checks:
    /// Block < Clarify <= CitationsOnly < Accept.
    pub fn tier(&self) -> u8 {
        match self {
            DecisionLabel::Block => 0,
            DecisionLabel::Clarify => 1,
            DecisionLabel::CitationsOnly => 2,
            DecisionLabel::Accept => 3,
        }
    }

    /// Whether the response text may be shown to the caller at all.
    pub fn releases_response(&self) -> bool {
        matches!(self, DecisionLabel::Accept | DecisionLabel::CitationsOnly)
    }
}

impl std::fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionLabel::Accept => write!(f, "accept"),
            DecisionLabel::Clarify => write!(f, "clarify"),
            DecisionLabel::CitationsOnly => write!(f, "citations_only"),
            DecisionLabel::Block => write!(f, "block"),
        }
    }
}

impl std::str::FromStr for DecisionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(DecisionLabel::Accept),
            "clarify" => Ok(DecisionLabel::Clarify),
            "citations_only" => Ok(DecisionLabel::CitationsOnly),
            "block" => Ok(DecisionLabel::Block),
            _ => Err(format!("Unknown decision label: {}", s)),
        }
    }
}

/// Terminal decision for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The chosen label.
    pub label: DecisionLabel,
    /// Name of the policy rule that fired, for audit.
    pub rule: String,
    /// Key of the user-facing message template, if any.
    pub message_key: Option<String>,
}

impl Decision {
    pub fn new(label: DecisionLabel, rule: impl Into<String>, message_key: Option<&str>) -> Self {
        Self {
            label,
            rule: rule.into(),
            message_key: message_key.map(str::to_string),
        }
    }

    /// Safe templated message for non-Accept outcomes. Raw internal error
    /// text never reaches the caller; it stays in the audit record.
    pub fn user_message(&self) -> Option<&'static str> {
        match self.message_key.as_deref() {
            Some("blocked_unsafe") => {
                Some("This request could not be completed because it failed a safety check.")
            }
            Some("blocked_low_trust") => {
                Some("We could not produce a sufficiently reliable answer to this request.")
            }
            Some("needs_clarification") => {
                Some("Could you rephrase or narrow your question? We need more context to answer reliably.")
            }
            Some("citations_required") => {
                Some("This answer is released with its supporting sources; unsupported claims were withheld.")
            }
            Some("upstream_unavailable") => {
                Some("The service is temporarily unable to answer this request. Please try again.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(DecisionLabel::Block.tier() < DecisionLabel::Clarify.tier());
        assert!(DecisionLabel::Clarify.tier() <= DecisionLabel::CitationsOnly.tier());
        assert!(DecisionLabel::CitationsOnly.tier() < DecisionLabel::Accept.tier());
    }

    #[test]
    fn test_release_gating() {
        assert!(DecisionLabel::Accept.releases_response());
        assert!(DecisionLabel::CitationsOnly.releases_response());
        assert!(!DecisionLabel::Clarify.releases_response());
        assert!(!DecisionLabel::Block.releases_response());
    }

    #[test]
    fn test_label_serialization() {
        let json = serde_json::to_string(&DecisionLabel::CitationsOnly).unwrap();
        assert_eq!(json, "\"citations_only\"");
    }

    #[test]
    fn test_user_message_is_templated() {
        let decision = Decision::new(DecisionLabel::Block, "input_stage_blocked", Some("blocked_unsafe"));
        assert!(decision.user_message().unwrap().contains("safety check"));

        let bare = Decision::new(DecisionLabel::Accept, "high_confidence", None);
        assert!(bare.user_message().is_none());
    }
}
