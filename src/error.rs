//! Error types for Trustgate.
//!
//! `GateError` is the unified crate error. Check-level failures (detector
//! errors, per-check timeouts) are deliberately *not* variants here: they are
//! recovered locally by the check adapter and degrade a single `CheckResult`
//! instead of aborting the run.

use thiserror::Error;

/// Unified error type for Trustgate operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// Invalid configuration. Fatal at load time; the pipeline never starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The retriever or model call failed. Aborts the current phase only and
    /// maps to a conservative terminal decision, never to Accept.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for GateError {
    fn from(e: config::ConfigError) -> Self {
        GateError::Config(e.to_string())
    }
}

/// Errors a detector implementation may surface.
///
/// The check adapter converts any of these into a `CheckResult` with
/// `verdict=error`; they never propagate past the adapter.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("External API call failed: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Trustgate operations.
pub type GateResult<T> = Result<T, GateError>;
