//! Stage runner - concurrent execution of one stage's checks.
//!
//! All checks of a stage are independent reads of the same immutable input,
//! so they run concurrently on a JoinSet. The runner waits for all of them or
//! for the stage deadline, whichever comes first, then rebuilds the results
//! in configured order so the report is deterministic regardless of
//! completion order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::domain::{CheckInput, CheckResult, StageKind, StageReport};
use crate::engine::adapter::CheckAdapter;

/// Runs the configured checks for one stage.
pub struct StageRunner {
    stage: StageKind,
    adapters: Vec<Arc<CheckAdapter>>,
    stage_timeout: std::time::Duration,
}

impl StageRunner {
    pub fn new(
        stage: StageKind,
        adapters: Vec<Arc<CheckAdapter>>,
        stage_timeout: std::time::Duration,
    ) -> Self {
        Self {
            stage,
            adapters,
            stage_timeout,
        }
    }

    pub fn stage(&self) -> StageKind {
        self.stage
    }

    /// Execute all checks and produce the stage report.
    ///
    /// Checks that have not returned when the stage deadline elapses are
    /// recorded as timeouts, regardless of their individual timeout settings.
    /// A short-circuiting failure does not cancel siblings already in flight;
    /// they finish (or hit the deadline) for audit completeness.
    pub async fn run(&self, input: Arc<CheckInput>) -> StageReport {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.stage_timeout;

        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::new();

        for (idx, adapter) in self.adapters.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let input = Arc::clone(&input);
            let handle = join_set.spawn(async move { (idx, adapter.run(&input).await) });
            task_index.insert(handle.id(), idx);
        }

        let mut slots: Vec<Option<CheckResult>> = vec![None; self.adapters.len()];

        loop {
            match tokio::time::timeout_at(deadline, join_set.join_next_with_id()).await {
                Ok(Some(Ok((_, (idx, result))))) => {
                    slots[idx] = Some(result);
                }
                Ok(Some(Err(join_err))) => {
                    // A check task panicked; degrade it to an error result.
                    if let Some(&idx) = task_index.get(&join_err.id()) {
                        tracing::error!(
                            stage = %self.stage,
                            check_id = %self.adapters[idx].id(),
                            error = %join_err,
                            "Check task failed"
                        );
                        slots[idx] = Some(self.adapters[idx].panic_result());
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        stage = %self.stage,
                        outstanding = join_set.len(),
                        "Stage deadline elapsed with checks outstanding"
                    );
                    join_set.abort_all();
                    break;
                }
            }
        }

        // Checks cut off by the stage deadline record the wall time actually
        // spent, not their own configured timeout.
        let cutoff_elapsed = started.elapsed();
        let results: Vec<CheckResult> = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| self.adapters[idx].timeout_result(cutoff_elapsed))
            })
            .collect();

        // Tie-break: the recorded block reason is the first check, by
        // configured order, whose condition holds.
        let block_reason = self
            .adapters
            .iter()
            .zip(results.iter())
            .find(|(adapter, result)| result.triggers_block(adapter.short_circuit()))
            .map(|(adapter, _)| adapter.id().to_string());

        let report = StageReport {
            stage: self.stage,
            blocked: block_reason.is_some(),
            block_reason,
            results,
            stage_elapsed: started.elapsed(),
        };

        tracing::debug!(
            stage = %self.stage,
            blocked = report.blocked,
            checks = report.results.len(),
            elapsed_ms = report.stage_elapsed.as_millis() as u64,
            "Stage complete"
        );

        report
    }
}
