//! Database models for Trustgate.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{Decision, PipelineRun};
use crate::error::GateError;

/// Database row for the pipeline_runs table.
#[derive(Debug, Clone, FromRow)]
pub struct PipelineRunRow {
    pub id: String,
    pub query: String,
    pub response: Option<String>,
    pub evidence: String,
    pub input_report: String,
    pub output_report: String,
    pub trust_score: Option<String>,
    pub trust_value: Option<f64>,
    pub decision: String,
    pub decision_rule: String,
    pub message_key: Option<String>,
    pub outcome: String,
    pub elapsed_ms: i64,
    pub started_at: String,
}

impl TryFrom<PipelineRunRow> for PipelineRun {
    type Error = GateError;

    fn try_from(row: PipelineRunRow) -> Result<Self, Self::Error> {
        Ok(PipelineRun {
            id: Uuid::parse_str(&row.id).map_err(|e| GateError::Internal(e.to_string()))?,
            query: row.query,
            response: row.response,
            evidence: serde_json::from_str(&row.evidence)?,
            input_report: serde_json::from_str(&row.input_report)?,
            output_report: serde_json::from_str(&row.output_report)?,
            trust_score: row
                .trust_score
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
            decision: Decision {
                label: row
                    .decision
                    .parse()
                    .map_err(GateError::Internal)?,
                rule: row.decision_rule,
                message_key: row.message_key,
            },
            outcome: row.outcome.parse().map_err(GateError::Internal)?,
            started_at: DateTime::parse_from_rfc3339(&row.started_at)
                .map_err(|e| GateError::Internal(e.to_string()))?
                .with_timezone(&Utc),
            total_elapsed: Duration::from_millis(row.elapsed_ms.max(0) as u64),
        })
    }
}
