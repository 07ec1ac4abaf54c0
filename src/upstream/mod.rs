//! Upstream collaborators: the retriever and the model call.
//!
//! The pipeline consumes these through traits only. Failures surface as
//! `GateError::Upstream` and are mapped by the orchestrator to a
//! conservative terminal decision, never to Accept.

mod memory;
mod openrouter;

pub use memory::{CannedModel, MemoryRetriever};
pub use openrouter::OpenRouterModel;

use async_trait::async_trait;

use crate::domain::Evidence;
use crate::error::GateResult;

/// Fetches evidence snippets for a query.
///
/// An empty result means "no evidence", not an error.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> GateResult<Vec<Evidence>>;
}

/// Produces a response text for a query plus its evidence.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, query: &str, evidence: &[Evidence]) -> GateResult<String>;
}
