//! Guardrail engine for Trustgate.
//!
//! This module contains the orchestration core:
//! - Check Adapter: normalizes one detector's output and bounds its time
//! - Stage Runner: runs a stage's checks concurrently under a deadline
//! - Pipeline Orchestrator: sequences input checks, retrieval, model call,
//!   output checks, scoring, and the decision
//! - Trust Aggregator: folds output signals into one score
//! - Decision Policy: maps score plus block flags to a release decision

mod adapter;
mod aggregator;
mod orchestrator;
mod policy;
mod stage;

pub use adapter::*;
pub use aggregator::*;
pub use orchestrator::*;
pub use policy::*;
pub use stage::*;
