//! Pipeline orchestrator.
//!
//! Sequences the phases of one run: input checks, retrieval, model call,
//! output checks, scoring, decision. Phase order is strict; checks inside a
//! phase are concurrent. A blocked input stage means the model is never
//! called; upstream failures and deadline expiry both resolve to a
//! configured conservative decision. Every query gets exactly one terminal
//! decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::config::ConservativeDecision;
use crate::domain::{
    CheckInput, Decision, DecisionLabel, Evidence, PipelineRun, RunOutcome, StageKind, StageReport,
};
use crate::engine::aggregator::TrustAggregator;
use crate::engine::policy::DecisionPolicy;
use crate::engine::stage::StageRunner;
use crate::upstream::{ModelClient, Retriever};

/// The assembled guardrail pipeline for one deployment.
///
/// Shared immutably across concurrent runs; holds no per-run state.
pub struct GuardrailPipeline {
    input_stage: StageRunner,
    output_stage: StageRunner,
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ModelClient>,
    aggregator: TrustAggregator,
    policy: DecisionPolicy,
    run_timeout: Duration,
    on_upstream_error: ConservativeDecision,
    on_deadline: ConservativeDecision,
}

/// Internal result of the phases that can fail upstream.
struct UpstreamFailure {
    phase: &'static str,
    message: String,
}

impl GuardrailPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_stage: StageRunner,
        output_stage: StageRunner,
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn ModelClient>,
        aggregator: TrustAggregator,
        policy: DecisionPolicy,
        run_timeout: Duration,
        on_upstream_error: ConservativeDecision,
        on_deadline: ConservativeDecision,
    ) -> Self {
        Self {
            input_stage,
            output_stage,
            retriever,
            model,
            aggregator,
            policy,
            run_timeout,
            on_upstream_error,
            on_deadline,
        }
    }

    /// Evaluate one query through the full pipeline.
    ///
    /// Never hangs: the whole run is bounded by the overall deadline, and
    /// deadline expiry forces a conservative terminal decision.
    pub async fn evaluate(&self, query: &str) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();

        tracing::info!(run_id = %run_id, "Pipeline run started");

        let mut run = match tokio::time::timeout(self.run_timeout, self.drive(run_id, query)).await
        {
            Ok(run) => run,
            Err(_) => {
                tracing::warn!(
                    run_id = %run_id,
                    timeout_ms = self.run_timeout.as_millis() as u64,
                    "Run deadline exceeded; forcing conservative decision"
                );
                PipelineRun {
                    id: run_id,
                    query: query.to_string(),
                    response: None,
                    evidence: Vec::new(),
                    input_report: StageReport::empty(StageKind::Input),
                    output_report: StageReport::empty(StageKind::Output),
                    trust_score: None,
                    decision: conservative_decision(
                        self.on_deadline,
                        "run_deadline_exceeded",
                        "upstream_unavailable",
                    ),
                    outcome: RunOutcome::DeadlineExceeded,
                    started_at,
                    total_elapsed: started.elapsed(),
                }
            }
        };

        run.started_at = started_at;
        run.total_elapsed = started.elapsed();

        tracing::info!(
            run_id = %run_id,
            decision = %run.decision.label,
            rule = %run.decision.rule,
            outcome = %run.outcome,
            trust = run.trust_score.as_ref().map(|s| s.value),
            elapsed_ms = run.total_elapsed.as_millis() as u64,
            "Pipeline run finished"
        );

        run
    }

    /// The phase sequence, without the overall deadline wrapper.
    async fn drive(&self, run_id: Uuid, query: &str) -> PipelineRun {
        // Phase: INPUT_CHECKING
        let input_report = self
            .input_stage
            .run(Arc::new(CheckInput::for_input(query)))
            .await;

        if input_report.blocked {
            // BLOCKED_AT_INPUT: unsafe input never reaches the model.
            tracing::warn!(
                run_id = %run_id,
                reason = input_report.block_reason.as_deref().unwrap_or(""),
                "Input stage blocked"
            );
            return self.blocked_run(run_id, query, input_report, None);
        }

        // Phase: RETRIEVING
        let evidence = match self.retriever.retrieve(query).await {
            Ok(evidence) => evidence,
            Err(e) => {
                return self.upstream_failure_run(
                    run_id,
                    query,
                    input_report,
                    UpstreamFailure {
                        phase: "retrieval",
                        message: e.to_string(),
                    },
                );
            }
        };

        // Phase: MODEL_CALL
        let response = match self.model.complete(query, &evidence).await {
            Ok(response) => response,
            Err(e) => {
                return self.upstream_failure_run(
                    run_id,
                    query,
                    input_report,
                    UpstreamFailure {
                        phase: "model_call",
                        message: e.to_string(),
                    },
                );
            }
        };

        // Phase: OUTPUT_CHECKING
        let output_input = CheckInput::for_output(query, evidence.clone(), response.clone());
        let output_report = self.output_stage.run(Arc::new(output_input)).await;

        if output_report.blocked {
            // BLOCKED_AT_OUTPUT: skip scoring entirely.
            tracing::warn!(
                run_id = %run_id,
                reason = output_report.block_reason.as_deref().unwrap_or(""),
                "Output stage blocked"
            );
            let mut run = self.blocked_run(run_id, query, input_report, Some(output_report));
            run.response = Some(response);
            run.evidence = evidence;
            run.outcome = RunOutcome::BlockedAtOutput;
            run.decision = Decision::new(
                DecisionLabel::Block,
                "output_stage_blocked",
                Some("blocked_unsafe"),
            );
            return run;
        }

        // Phase: SCORING
        let score = self.aggregator.aggregate(&output_report);

        // Phase: DECIDED
        let decision = self
            .policy
            .decide(&score, &input_report, &output_report, !evidence.is_empty());

        PipelineRun {
            id: run_id,
            query: query.to_string(),
            response: Some(response),
            evidence,
            input_report,
            output_report,
            trust_score: Some(score),
            decision,
            outcome: RunOutcome::Completed,
            started_at: Utc::now(),
            total_elapsed: Duration::ZERO,
        }
    }

    fn blocked_run(
        &self,
        run_id: Uuid,
        query: &str,
        input_report: StageReport,
        output_report: Option<StageReport>,
    ) -> PipelineRun {
        PipelineRun {
            id: run_id,
            query: query.to_string(),
            response: None,
            evidence: Vec::new(),
            input_report,
            output_report: output_report.unwrap_or_else(|| StageReport::empty(StageKind::Output)),
            trust_score: None,
            decision: Decision::new(
                DecisionLabel::Block,
                "input_stage_blocked",
                Some("blocked_unsafe"),
            ),
            outcome: RunOutcome::BlockedAtInput,
            started_at: Utc::now(),
            total_elapsed: Duration::ZERO,
        }
    }

    fn upstream_failure_run(
        &self,
        run_id: Uuid,
        query: &str,
        input_report: StageReport,
        failure: UpstreamFailure,
    ) -> PipelineRun {
        tracing::error!(
            run_id = %run_id,
            phase = failure.phase,
            error = %failure.message,
            "Upstream call failed"
        );

        let rule = match failure.phase {
            "retrieval" => "retrieval_failed",
            _ => "model_call_failed",
        };

        PipelineRun {
            id: run_id,
            query: query.to_string(),
            response: None,
            evidence: Vec::new(),
            input_report,
            output_report: StageReport::empty(StageKind::Output),
            trust_score: None,
            decision: conservative_decision(self.on_upstream_error, rule, "upstream_unavailable"),
            outcome: RunOutcome::UpstreamError,
            started_at: Utc::now(),
            total_elapsed: Duration::ZERO,
        }
    }
}

/// Map a configured fallback to a concrete decision. Accept is not
/// representable here by construction.
fn conservative_decision(
    fallback: ConservativeDecision,
    rule: &str,
    message_key: &str,
) -> Decision {
    let label = match fallback {
        ConservativeDecision::Block => DecisionLabel::Block,
        ConservativeDecision::Clarify => DecisionLabel::Clarify,
    };
    Decision::new(label, rule, Some(message_key))
}
