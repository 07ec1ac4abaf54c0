//! Contradiction risk heuristic.
//!
//! For each response sentence that is lexically close to an evidence
//! sentence, a mismatch in negation between the two raises contradiction
//! risk. The signal is the fraction of comparable sentences that mismatch
//! (negative trust direction: high signal = low trust).

use async_trait::async_trait;

use crate::domain::CheckInput;
use crate::engine::{Detector, RawVerdict};
use crate::error::DetectorError;

use super::text::{content_words, has_negation, jaccard, sentences};

/// Word-overlap similarity above which two sentences are comparable.
const COMPARABLE_SIMILARITY: f64 = 0.4;

/// Risk at or above which the verdict is a warning.
const WARN_AT: f64 = 0.5;

pub struct ContradictionChecker;

#[async_trait]
impl Detector for ContradictionChecker {
    fn name(&self) -> &str {
        "contradiction"
    }

    async fn detect(&self, input: &CheckInput) -> Result<RawVerdict, DetectorError> {
        let response = input.response.as_deref().ok_or_else(|| {
            DetectorError::InvalidInput(
                "contradiction checker requires a model response".to_string(),
            )
        })?;

        let evidence_sentences: Vec<&str> = input
            .evidence
            .iter()
            .flat_map(|e| sentences(&e.text))
            .collect();

        let mut compared = 0usize;
        let mut mismatches = 0usize;

        for response_sentence in sentences(response) {
            let response_words = content_words(response_sentence);
            if response_words.is_empty() {
                continue;
            }
            for evidence_sentence in &evidence_sentences {
                let evidence_words = content_words(evidence_sentence);
                if jaccard(&response_words, &evidence_words) < COMPARABLE_SIMILARITY {
                    continue;
                }
                compared += 1;
                if has_negation(response_sentence) != has_negation(evidence_sentence) {
                    mismatches += 1;
                }
            }
        }

        // Nothing comparable means no observed contradiction.
        let risk = if compared == 0 {
            0.0
        } else {
            mismatches as f64 / compared as f64
        };

        let detail = serde_json::json!({
            "compared_pairs": compared,
            "negation_mismatches": mismatches,
        });

        if risk >= WARN_AT {
            Ok(RawVerdict::warn(risk, detail))
        } else {
            Ok(RawVerdict::pass(risk).with_detail(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Evidence;
    use crate::engine::RawOutcome;

    #[tokio::test]
    async fn test_consistent_response_has_zero_risk() {
        let input = CheckInput::for_output(
            "q",
            vec![Evidence::new("doc1", "Paris is the capital city of France.")],
            "The capital city of France is Paris.",
        );
        let verdict = ContradictionChecker.detect(&input).await.unwrap();
        assert_eq!(verdict.outcome, RawOutcome::Pass);
        assert_eq!(verdict.signal, Some(0.0));
    }

    #[tokio::test]
    async fn test_negation_mismatch_raises_risk() {
        let input = CheckInput::for_output(
            "q",
            vec![Evidence::new("doc1", "Paris is the capital city of France.")],
            "Paris is not the capital city of France.",
        );
        let verdict = ContradictionChecker.detect(&input).await.unwrap();
        assert_eq!(verdict.outcome, RawOutcome::Warn);
        assert_eq!(verdict.signal, Some(1.0));
    }

    #[tokio::test]
    async fn test_unrelated_text_is_not_compared() {
        let input = CheckInput::for_output(
            "q",
            vec![Evidence::new("doc1", "The Danube flows through Vienna.")],
            "Paris is not the capital of Germany.",
        );
        let verdict = ContradictionChecker.detect(&input).await.unwrap();
        assert_eq!(verdict.signal, Some(0.0));
        assert_eq!(verdict.detail["compared_pairs"], 0);
    }

    #[tokio::test]
    async fn test_missing_response_is_detector_error() {
        assert!(ContradictionChecker
            .detect(&CheckInput::for_input("q"))
            .await
            .is_err());
    }
}
