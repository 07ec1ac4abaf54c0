//! Grounding coverage scoring.
//!
//! Measures how much of the response is supported by the retrieved
//! evidence: a response sentence counts as covered when enough of its
//! content words appear somewhere in the evidence. The signal is the covered
//! fraction (positive trust direction).

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::CheckInput;
use crate::engine::{Detector, RawVerdict};
use crate::error::DetectorError;

use super::text::{content_words, sentences};

/// Fraction of a sentence's content words that must appear in the evidence
/// for the sentence to count as covered.
const SENTENCE_COVERAGE_BAR: f64 = 0.5;

/// Coverage below which the verdict is a warning rather than a pass.
const WARN_BELOW: f64 = 0.3;

pub struct GroundingScorer;

#[async_trait]
impl Detector for GroundingScorer {
    fn name(&self) -> &str {
        "grounding"
    }

    async fn detect(&self, input: &CheckInput) -> Result<RawVerdict, DetectorError> {
        let response = input.response.as_deref().ok_or_else(|| {
            DetectorError::InvalidInput("grounding scorer requires a model response".to_string())
        })?;

        if input.evidence.is_empty() {
            // No evidence retrieved: nothing is grounded.
            return Ok(RawVerdict::warn(
                0.0,
                serde_json::json!({ "reason": "no evidence retrieved" }),
            ));
        }

        let evidence_words: HashSet<String> = input
            .evidence
            .iter()
            .flat_map(|e| content_words(&e.text))
            .collect();

        let response_sentences = sentences(response);
        if response_sentences.is_empty() {
            return Ok(RawVerdict::warn(
                0.0,
                serde_json::json!({ "reason": "empty response" }),
            ));
        }

        let mut covered = 0usize;
        for sentence in &response_sentences {
            let words = content_words(sentence);
            if words.is_empty() {
                continue;
            }
            let hits = words.iter().filter(|w| evidence_words.contains(*w)).count();
            if hits as f64 / words.len() as f64 >= SENTENCE_COVERAGE_BAR {
                covered += 1;
            }
        }

        let coverage = covered as f64 / response_sentences.len() as f64;
        let detail = serde_json::json!({
            "covered_sentences": covered,
            "total_sentences": response_sentences.len(),
        });

        if coverage < WARN_BELOW {
            Ok(RawVerdict::warn(coverage, detail))
        } else {
            Ok(RawVerdict::pass(coverage).with_detail(detail))
        }
    }
}
