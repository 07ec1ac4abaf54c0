//! In-memory reference implementations of the upstream collaborators.
//!
//! Used by the demo binary when no external model is configured, and by
//! tests that need deterministic upstream behavior.

use async_trait::async_trait;

use crate::domain::Evidence;
use crate::error::GateResult;

use super::{ModelClient, Retriever};

/// Keyword-overlap retriever over a fixed snippet set.
pub struct MemoryRetriever {
    snippets: Vec<Evidence>,
}

impl MemoryRetriever {
    pub fn new(snippets: Vec<Evidence>) -> Self {
        Self { snippets }
    }

    fn overlaps(query: &str, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .any(|w| text_lower.contains(w))
    }
}

#[async_trait]
impl Retriever for MemoryRetriever {
    async fn retrieve(&self, query: &str) -> GateResult<Vec<Evidence>> {
        let hits: Vec<Evidence> = self
            .snippets
            .iter()
            .filter(|s| Self::overlaps(query, &s.text))
            .cloned()
            .collect();

        tracing::debug!(hits = hits.len(), "Memory retriever matched snippets");
        Ok(hits)
    }
}

/// Model client that answers from the evidence it is given, or with a fixed
/// fallback when there is none.
pub struct CannedModel {
    fallback: String,
}

impl CannedModel {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl Default for CannedModel {
    fn default() -> Self {
        Self::new("I don't have enough information to answer that.")
    }
}

#[async_trait]
impl ModelClient for CannedModel {
    async fn complete(&self, _query: &str, evidence: &[Evidence]) -> GateResult<String> {
        if evidence.is_empty() {
            return Ok(self.fallback.clone());
        }
        Ok(evidence
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
