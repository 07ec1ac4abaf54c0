//! PII detection.
//!
//! Regex recognizers for common personally identifiable information. Scans
//! the model response when present (output stage), otherwise the query.
//! The audit detail names the kinds found, never the matched text.

use async_trait::async_trait;
use regex::Regex;

use crate::domain::CheckInput;
use crate::engine::{Detector, RawVerdict};
use crate::error::{DetectorError, GateError, GateResult};

const PII_PATTERNS: &[(&str, &str)] = &[
    (
        "email",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    ),
    (
        "phone",
        r"\b(\+\d{1,2}\s?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b",
    ),
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    ("credit_card", r"\b(?:\d{4}[- ]?){3}\d{4}\b"),
];

/// Regex-based PII recognizer.
pub struct PiiDetector {
    patterns: Vec<(&'static str, Regex)>,
}

impl PiiDetector {
    pub fn new() -> GateResult<Self> {
        let patterns = PII_PATTERNS
            .iter()
            .map(|&(kind, pattern)| {
                Regex::new(pattern)
                    .map(|re| (kind, re))
                    .map_err(|e| GateError::Config(format!("bad PII pattern '{}': {}", kind, e)))
            })
            .collect::<GateResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }
}

#[async_trait]
impl Detector for PiiDetector {
    fn name(&self) -> &str {
        "pii"
    }

    async fn detect(&self, input: &CheckInput) -> Result<RawVerdict, DetectorError> {
        let text = input.response.as_deref().unwrap_or(&input.query);

        let mut kinds = Vec::new();
        let mut total_matches = 0usize;
        for (kind, pattern) in &self.patterns {
            let count = pattern.find_iter(text).count();
            if count > 0 {
                kinds.push(*kind);
                total_matches += count;
            }
        }

        if kinds.is_empty() {
            return Ok(RawVerdict::pass(0.0));
        }

        // Each additional distinct kind raises the signal.
        let signal = (0.6 + 0.2 * (kinds.len() as f64 - 1.0)).min(1.0);
        let detail = serde_json::json!({
            "kinds": kinds,
            "match_count": total_matches,
        });

        Ok(RawVerdict::fail(signal, detail))
    }
}
