//! Repository layer for audit persistence.
//!
//! Pipeline runs are write-once: one insert per finalized run, reads only
//! afterwards.

use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::PipelineRun;
use crate::error::GateResult;
use crate::storage::models::PipelineRunRow;

/// Repository for pipeline run audit records.
#[derive(Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> GateResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_runs (
                id TEXT PRIMARY KEY,
                query TEXT NOT NULL,
                response TEXT,
                evidence TEXT NOT NULL,
                input_report TEXT NOT NULL,
                output_report TEXT NOT NULL,
                trust_score TEXT,
                trust_value REAL,
                decision TEXT NOT NULL,
                decision_rule TEXT NOT NULL,
                message_key TEXT,
                outcome TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                started_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pipeline_runs_decision ON pipeline_runs(decision);
            CREATE INDEX IF NOT EXISTS idx_pipeline_runs_started_at ON pipeline_runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist one finalized run.
    pub async fn insert_run(&self, run: &PipelineRun) -> GateResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_runs (
                id, query, response, evidence, input_report, output_report,
                trust_score, trust_value, decision, decision_rule, message_key,
                outcome, elapsed_ms, started_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.id.to_string())
        .bind(&run.query)
        .bind(&run.response)
        .bind(serde_json::to_string(&run.evidence)?)
        .bind(serde_json::to_string(&run.input_report)?)
        .bind(serde_json::to_string(&run.output_report)?)
        .bind(
            run.trust_score
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .bind(run.trust_score.as_ref().map(|s| s.value))
        .bind(run.decision.label.to_string())
        .bind(&run.decision.rule)
        .bind(&run.decision.message_key)
        .bind(run.outcome.to_string())
        .bind(run.total_elapsed.as_millis() as i64)
        .bind(run.started_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch one run by id.
    pub async fn get_run(&self, id: Uuid) -> GateResult<Option<PipelineRun>> {
        let row: Option<PipelineRunRow> =
            sqlx::query_as("SELECT * FROM pipeline_runs WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(PipelineRun::try_from).transpose()
    }

    /// Most recent runs, newest first.
    pub async fn list_recent(&self, limit: i64) -> GateResult<Vec<PipelineRun>> {
        let rows: Vec<PipelineRunRow> =
            sqlx::query_as("SELECT * FROM pipeline_runs ORDER BY started_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(PipelineRun::try_from).collect()
    }
}
