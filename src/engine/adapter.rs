//! Check adapter - the boundary between the pipeline and one detector.
//!
//! The adapter invokes an externally supplied detector under a bounded-time
//! execution and converts whatever comes back (a verdict, an error, or
//! nothing at all) into a typed [`CheckResult`]. It never returns an error
//! outward: one misbehaving detector must never abort the pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::CheckConfig;
use crate::domain::{CheckInput, CheckResult, Severity, Verdict};
use crate::error::DetectorError;

/// Coarse outcome a detector reports before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawOutcome {
    /// The condition tested for is absent.
    Pass,
    /// Something was noticed, below the detector's own failure bar.
    Warn,
    /// The condition was detected.
    Fail,
}

/// Un-normalized detector output.
#[derive(Debug, Clone)]
pub struct RawVerdict {
    pub outcome: RawOutcome,
    /// Detection strength in [0,1]; the adapter clamps out-of-range values.
    pub signal: Option<f64>,
    /// Opaque payload preserved in the audit record.
    pub detail: serde_json::Value,
}

impl RawVerdict {
    pub fn pass(signal: f64) -> Self {
        Self {
            outcome: RawOutcome::Pass,
            signal: Some(signal),
            detail: serde_json::Value::Null,
        }
    }

    pub fn warn(signal: f64, detail: serde_json::Value) -> Self {
        Self {
            outcome: RawOutcome::Warn,
            signal: Some(signal),
            detail,
        }
    }

    pub fn fail(signal: f64, detail: serde_json::Value) -> Self {
        Self {
            outcome: RawOutcome::Fail,
            signal: Some(signal),
            detail,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// A single guardrail capability: produce a [`RawVerdict`] from a
/// [`CheckInput`].
///
/// Implementations range from regex pattern matchers to remote classifiers.
/// New detectors plug in here without touching the orchestrator.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detector name (for logging and errors).
    fn name(&self) -> &str;

    /// Examine the input and report a verdict.
    async fn detect(&self, input: &CheckInput) -> Result<RawVerdict, DetectorError>;
}

/// Uniform wrapper around one configured detector.
pub struct CheckAdapter {
    id: String,
    severity: Severity,
    short_circuit: bool,
    timeout: Duration,
    detector: Arc<dyn Detector>,
}

impl CheckAdapter {
    /// Build an adapter from its registry entry. `default_timeout` applies
    /// when the check has no per-check override.
    pub fn new(config: &CheckConfig, default_timeout: Duration, detector: Arc<dyn Detector>) -> Self {
        Self {
            id: config.id.clone(),
            severity: config.severity,
            short_circuit: config.short_circuit,
            timeout: config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default_timeout),
            detector,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn short_circuit(&self) -> bool {
        self.short_circuit
    }

    /// Run the detector under the per-check timeout.
    ///
    /// A detector error becomes `verdict=error` with the message preserved in
    /// `detail`; a timeout becomes `verdict=timeout`. Neither carries a signal.
    pub async fn run(&self, input: &CheckInput) -> CheckResult {
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, self.detector.detect(input)).await {
            Ok(Ok(raw)) => self.normalize(raw, started.elapsed()),
            Ok(Err(e)) => {
                tracing::warn!(
                    check_id = %self.id,
                    detector = %self.detector.name(),
                    error = %e,
                    "Detector failed"
                );
                CheckResult {
                    check_id: self.id.clone(),
                    verdict: Verdict::Error,
                    signal: None,
                    severity: self.severity,
                    detail: serde_json::json!({ "error": e.to_string() }),
                    elapsed: started.elapsed(),
                }
            }
            Err(_) => {
                tracing::warn!(
                    check_id = %self.id,
                    detector = %self.detector.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Detector timed out"
                );
                self.timeout_result(started.elapsed())
            }
        }
    }

    /// Result recorded when the check never produced a verdict in time.
    /// Also used by the stage runner for checks cut off by the stage
    /// deadline; `elapsed` is the wall time actually spent, not the
    /// configured timeout.
    pub fn timeout_result(&self, elapsed: Duration) -> CheckResult {
        CheckResult {
            check_id: self.id.clone(),
            verdict: Verdict::Timeout,
            signal: None,
            severity: self.severity,
            detail: serde_json::Value::Null,
            elapsed,
        }
    }

    /// Result recorded when the check's task panicked.
    pub fn panic_result(&self) -> CheckResult {
        CheckResult {
            check_id: self.id.clone(),
            verdict: Verdict::Error,
            signal: None,
            severity: self.severity,
            detail: serde_json::json!({ "error": "check task panicked" }),
            elapsed: Duration::ZERO,
        }
    }

    fn normalize(&self, raw: RawVerdict, elapsed: Duration) -> CheckResult {
        let verdict = match raw.outcome {
            RawOutcome::Pass => Verdict::Pass,
            RawOutcome::Warn => Verdict::Warn,
            RawOutcome::Fail => Verdict::Fail,
        };
        // Non-finite signals are dropped rather than clamped.
        let signal = raw
            .signal
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 1.0));

        CheckResult {
            check_id: self.id.clone(),
            verdict,
            signal,
            severity: self.severity,
            detail: raw.detail,
            elapsed,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn adapter(detector: Arc<dyn Detector>) -> CheckAdapter {
        CheckAdapter::new(
            &check_config("jailbreak", Severity::High, true),
            Duration::from_millis(50),
            detector,
        )
    }

    #[tokio::test]
    async fn test_pass_verdict_normalized() {
        let adapter = adapter(Arc::new(FixedDetector::new(RawVerdict::pass(0.0))));
        let result = adapter.run(&CheckInput::for_input("hello")).await;

        assert_eq!(result.verdict, Verdict::Pass);
        assert_eq!(result.signal, Some(0.0));
        assert_eq!(result.check_id, "jailbreak");
        assert_eq!(result.severity, Severity::High);
    }

    #[tokio::test]
    async fn test_signal_clamped_to_unit_interval() {
        let adapter = adapter(Arc::new(FixedDetector::new(RawVerdict::fail(
            1.7,
            serde_json::Value::Null,
        ))));
        let result = adapter.run(&CheckInput::for_input("hello")).await;
        assert_eq!(result.signal, Some(1.0));
    }

    #[tokio::test]
    async fn test_nan_signal_dropped() {
        let adapter = adapter(Arc::new(FixedDetector::new(RawVerdict::pass(f64::NAN))));
        let result = adapter.run(&CheckInput::for_input("hello")).await;
        assert_eq!(result.signal, None);
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn test_detector_error_becomes_error_result() {
        let adapter = adapter(Arc::new(FailingDetector));
        let result = adapter.run(&CheckInput::for_input("hello")).await;

        assert_eq!(result.verdict, Verdict::Error);
        assert_eq!(result.signal, None);
        assert_eq!(result.detail["error"], "Inference failed: model unavailable");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_detector_times_out() {
        let adapter = adapter(Arc::new(HangingDetector));
        let result = adapter.run(&CheckInput::for_input("hello")).await;

        assert_eq!(result.verdict, Verdict::Timeout);
        assert_eq!(result.signal, None);
        // Recorded wall time never exceeds the configured timeout.
        assert!(result.elapsed <= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_per_check_timeout_override() {
        let mut config = check_config("slow", Severity::Low, false);
        config.timeout_ms = Some(200);
        let detector = Arc::new(FixedDetector {
            verdict: RawVerdict::pass(0.0),
            delay: Duration::from_millis(100),
        });
        let adapter = CheckAdapter::new(&config, Duration::from_millis(10), detector);

        let result = adapter.run(&CheckInput::for_input("hello")).await;
        assert_eq!(result.verdict, Verdict::Pass);
    }
}
