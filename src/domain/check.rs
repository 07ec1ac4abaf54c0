//! Check-related domain types.
//!
//! A check is one guardrail run against a query or a model response. Every
//! detector outcome, however it failed, is normalized into a [`CheckResult`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which pipeline stage a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Checks run against the user query, before any model call.
    Input,
    /// Checks run against the model response plus retrieved evidence.
    Output,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Input => write!(f, "input"),
            StageKind::Output => write!(f, "output"),
        }
    }
}

/// Normalized verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The condition the check tests for is absent.
    Pass,
    /// The condition was detected.
    Fail,
    /// Something was noticed but below the check's own failure bar.
    Warn,
    /// The detector itself failed; no signal available.
    Error,
    /// The detector did not return in time; no signal available.
    Timeout,
}

impl Verdict {
    /// Error and Timeout results carry no signal and do not participate
    /// in trust aggregation.
    pub fn signal_available(&self) -> bool {
        !matches!(self, Verdict::Error | Verdict::Timeout)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "pass"),
            Verdict::Fail => write!(f, "fail"),
            Verdict::Warn => write!(f, "warn"),
            Verdict::Error => write!(f, "error"),
            Verdict::Timeout => write!(f, "timeout"),
        }
    }
}

/// Configured severity of a check, independent of its numeric signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Only High and Critical failures can trigger a stage short-circuit.
    pub fn can_block(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A retrieved evidence snippet supporting (or contradicting) a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Where the snippet came from (document id, URL, ...).
    pub source: String,
    /// The snippet text.
    pub text: String,
}

impl Evidence {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Read-only view handed to every detector in a stage.
///
/// Input-stage checks see only the query; output-stage checks additionally
/// see the retrieved evidence and the model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInput {
    /// The user query text.
    pub query: String,
    /// Evidence snippets from the retriever (empty = no evidence).
    pub evidence: Vec<Evidence>,
    /// The model response text; absent for input-stage checks.
    pub response: Option<String>,
}

impl CheckInput {
    /// View for the input stage: query only.
    pub fn for_input(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            evidence: Vec::new(),
            response: None,
        }
    }

    /// View for the output stage: query, evidence, and response.
    pub fn for_output(
        query: impl Into<String>,
        evidence: Vec<Evidence>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            evidence,
            response: Some(response.into()),
        }
    }
}

/// Normalized output of one detector run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identifier of the check, unique within its stage configuration.
    pub check_id: String,
    /// Normalized verdict.
    pub verdict: Verdict,
    /// Check-specific score in [0,1]; None for Error/Timeout.
    pub signal: Option<f64>,
    /// Configured severity of the check.
    pub severity: Severity,
    /// Opaque payload for audit; not interpreted by the core.
    pub detail: serde_json::Value,
    /// Wall time the check took (or was allowed to take).
    pub elapsed: Duration,
}

impl CheckResult {
    /// Whether this result can trigger a stage short-circuit, given the
    /// check's configured short_circuit flag.
    pub fn triggers_block(&self, short_circuit: bool) -> bool {
        short_circuit && self.verdict == Verdict::Fail && self.severity.can_block()
    }
}

/// Immutable record of one stage's execution.
///
/// Constructed once by the stage runner; every downstream component holds it
/// read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage this report covers.
    pub stage: StageKind,
    /// Results in configured check order, regardless of completion order.
    pub results: Vec<CheckResult>,
    /// True if any result triggered a hard short-circuit.
    pub blocked: bool,
    /// check_id of the first blocking check by configured order.
    pub block_reason: Option<String>,
    /// Total wall time for the stage.
    pub stage_elapsed: Duration,
}

impl StageReport {
    /// An empty report for a stage that never ran (e.g. run deadline hit
    /// before the stage started).
    pub fn empty(stage: StageKind) -> Self {
        Self {
            stage,
            results: Vec::new(),
            blocked: false,
            block_reason: None,
            stage_elapsed: Duration::ZERO,
        }
    }

    /// Look up a result by check id.
    pub fn result(&self, check_id: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check_id == check_id)
    }
}
