//! The pipeline run envelope.
//!
//! Ties one query to its stage reports, trust score, and decision. Write-once:
//! finalized by the orchestrator and only read afterwards (audit log, caller).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check::{Evidence, StageReport};
use super::decision::Decision;
use super::score::TrustScore;

/// How the run terminated, for audit and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// All phases ran; the decision came from the policy engine.
    Completed,
    /// Input stage short-circuited; the model was never called.
    BlockedAtInput,
    /// Output stage short-circuited; scoring was skipped.
    BlockedAtOutput,
    /// Retriever or model call failed; conservative decision applied.
    UpstreamError,
    /// The overall run deadline expired; conservative decision applied.
    DeadlineExceeded,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::BlockedAtInput => write!(f, "blocked_at_input"),
            RunOutcome::BlockedAtOutput => write!(f, "blocked_at_output"),
            RunOutcome::UpstreamError => write!(f, "upstream_error"),
            RunOutcome::DeadlineExceeded => write!(f, "deadline_exceeded"),
        }
    }
}

impl std::str::FromStr for RunOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(RunOutcome::Completed),
            "blocked_at_input" => Ok(RunOutcome::BlockedAtInput),
            "blocked_at_output" => Ok(RunOutcome::BlockedAtOutput),
            "upstream_error" => Ok(RunOutcome::UpstreamError),
            "deadline_exceeded" => Ok(RunOutcome::DeadlineExceeded),
            _ => Err(format!("Unknown run outcome: {}", s)),
        }
    }
}

/// Immutable record of one full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// The user query.
    pub query: String,
    /// The model response, if the model was reached. Release to the caller
    /// is gated by `decision.label`, not by presence here.
    pub response: Option<String>,
    /// Evidence retrieved for the query.
    pub evidence: Vec<Evidence>,
    /// Input stage report.
    pub input_report: StageReport,
    /// Output stage report.
    pub output_report: StageReport,
    /// Trust score; None when scoring was skipped (blocks, upstream errors).
    pub trust_score: Option<TrustScore>,
    /// The terminal decision. Always present; the orchestrator guarantees
    /// exactly one per query.
    pub decision: Decision,
    /// How the run terminated.
    pub outcome: RunOutcome,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total wall time for the run.
    pub total_elapsed: Duration,
}

impl PipelineRun {
    /// The response text the caller is allowed to see, per the decision.
    pub fn released_response(&self) -> Option<&str> {
        if self.decision.label.releases_response() {
            self.response.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check::StageKind;
    use crate::domain::decision::DecisionLabel;

    fn make_run(label: DecisionLabel) -> PipelineRun {
        PipelineRun {
            id: Uuid::new_v4(),
            query: "q".to_string(),
            response: Some("answer".to_string()),
            evidence: Vec::new(),
            input_report: StageReport::empty(StageKind::Input),
            output_report: StageReport::empty(StageKind::Output),
            trust_score: None,
            decision: Decision::new(label, "test", None),
            outcome: RunOutcome::Completed,
            started_at: Utc::now(),
            total_elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_response_withheld_on_block() {
        assert!(make_run(DecisionLabel::Block).released_response().is_none());
        assert!(make_run(DecisionLabel::Clarify).released_response().is_none());
        assert_eq!(
            make_run(DecisionLabel::Accept).released_response(),
            Some("answer")
        );
    }
}
