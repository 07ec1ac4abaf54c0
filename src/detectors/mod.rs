//! Built-in detector implementations.
//!
//! Each detector implements the engine's `Detector` trait and is selected by
//! a `DetectorKind` in the check registry. The orchestration core never
//! depends on any concrete detector; new ones plug in through the same
//! factory.

mod contradiction;
mod grounding;
mod jailbreak;
mod pii;
mod relevance;
mod text;

pub use contradiction::ContradictionChecker;
pub use grounding::GroundingScorer;
pub use jailbreak::JailbreakDetector;
pub use pii::PiiDetector;
pub use relevance::RelevanceJudge;

use std::sync::Arc;

use crate::config::DetectorKind;
use crate::engine::Detector;
use crate::error::GateResult;

/// Instantiate the detector behind a registry entry.
pub fn build(kind: DetectorKind) -> GateResult<Arc<dyn Detector>> {
    Ok(match kind {
        DetectorKind::Jailbreak => Arc::new(JailbreakDetector::new()?),
        DetectorKind::Pii => Arc::new(PiiDetector::new()?),
        DetectorKind::Grounding => Arc::new(GroundingScorer),
        DetectorKind::Contradiction => Arc::new(ContradictionChecker),
        DetectorKind::Relevance => Arc::new(RelevanceJudge),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_builds() {
        for kind in [
            DetectorKind::Jailbreak,
            DetectorKind::Pii,
            DetectorKind::Grounding,
            DetectorKind::Contradiction,
            DetectorKind::Relevance,
        ] {
            assert!(build(kind).is_ok());
        }
    }
}
