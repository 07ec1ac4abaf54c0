//! Relevance judgment.
//!
//! Content-word overlap between the query and the response (positive trust
//! direction). A response that shares nothing with the question is likely
//! off-topic however fluent it is.

use async_trait::async_trait;

use crate::domain::CheckInput;
use crate::engine::{Detector, RawVerdict};
use crate::error::DetectorError;

use super::text::{content_words, jaccard};

/// Overlap below which the verdict is a warning.
const WARN_BELOW: f64 = 0.1;

pub struct RelevanceJudge;

#[async_trait]
impl Detector for RelevanceJudge {
    fn name(&self) -> &str {
        "relevance"
    }

    async fn detect(&self, input: &CheckInput) -> Result<RawVerdict, DetectorError> {
        let response = input.response.as_deref().ok_or_else(|| {
            DetectorError::InvalidInput("relevance judge requires a model response".to_string())
        })?;

        let query_words = content_words(&input.query);
        let response_words = content_words(response);
        let overlap = jaccard(&query_words, &response_words);

        let detail = serde_json::json!({
            "query_terms": query_words.len(),
            "response_terms": response_words.len(),
        });

        if overlap < WARN_BELOW {
            Ok(RawVerdict::warn(overlap, detail))
        } else {
            Ok(RawVerdict::pass(overlap).with_detail(detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawOutcome;

    #[tokio::test]
    async fn test_on_topic_response_scores_high() {
        let input = CheckInput::for_output(
            "What is the capital of France?",
            vec![],
            "The capital of France is Paris.",
        );
        let verdict = RelevanceJudge.detect(&input).await.unwrap();
        assert_eq!(verdict.outcome, RawOutcome::Pass);
        assert!(verdict.signal.unwrap() > 0.3);
    }

    #[tokio::test]
    async fn test_off_topic_response_warns() {
        let input = CheckInput::for_output(
            "What is the capital of France?",
            vec![],
            "Bananas ripen faster inside paper bags.",
        );
        let verdict = RelevanceJudge.detect(&input).await.unwrap();
        assert_eq!(verdict.outcome, RawOutcome::Warn);
        assert_eq!(verdict.signal, Some(0.0));
    }

    #[tokio::test]
    async fn test_missing_response_is_detector_error() {
        assert!(RelevanceJudge
            .detect(&CheckInput::for_input("q"))
            .await
            .is_err());
    }
}
