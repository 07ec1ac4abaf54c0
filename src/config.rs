//! Configuration module for Trustgate.
//!
//! Loads configuration from YAML files and environment variables, then
//! validates it fail-fast: an invalid threshold ordering, negative weight, or
//! out-of-range imputation default prevents the pipeline from ever starting.
//! The loaded `Config` is process-wide read-only state for the lifetime of
//! the process; nothing mutates it at request time.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{Severity, StageKind};
use crate::error::{GateError, GateResult};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
    /// Registry of configured checks, in execution order per stage.
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Pipeline-wide timing, scoring, and fallback configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub thresholds: ThresholdConfig,
    /// Score assigned when every output signal is missing.
    #[serde(default = "default_score_floor")]
    pub score_floor: f64,
    /// Default per-check timeout; individual checks may override.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
    /// Aggregate deadline for one stage.
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
    /// Overall deadline for one pipeline run.
    #[serde(default = "default_run_timeout_ms")]
    pub run_timeout_ms: u64,
    /// Decision applied when the retriever or model call fails.
    #[serde(default)]
    pub on_upstream_error: ConservativeDecision,
    /// Decision applied when the overall run deadline expires.
    #[serde(default)]
    pub on_deadline: ConservativeDecision,
}

fn default_score_floor() -> f64 {
    0.1
}
fn default_check_timeout_ms() -> u64 {
    2_000
}
fn default_stage_timeout_ms() -> u64 {
    5_000
}
fn default_run_timeout_ms() -> u64 {
    30_000
}

impl PipelineConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }
}

/// The three ordered confidence thresholds the policy engine branches on.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThresholdConfig {
    pub low_confidence: f64,
    pub medium_confidence: f64,
    pub high_confidence: f64,
}

impl ThresholdConfig {
    /// Enforce low <= medium <= high, all within [0,1].
    pub fn validate(&self) -> GateResult<()> {
        for (name, v) in [
            ("low_confidence", self.low_confidence),
            ("medium_confidence", self.medium_confidence),
            ("high_confidence", self.high_confidence),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(GateError::Config(format!(
                    "threshold {} must be in [0,1], got {}",
                    name, v
                )));
            }
        }
        if self.low_confidence > self.medium_confidence
            || self.medium_confidence > self.high_confidence
        {
            return Err(GateError::Config(format!(
                "thresholds must satisfy low <= medium <= high, got {} / {} / {}",
                self.low_confidence, self.medium_confidence, self.high_confidence
            )));
        }
        Ok(())
    }
}

/// Fallback decisions for upstream failures and deadline expiry.
///
/// Only Block and Clarify are representable: a failed upstream can never be
/// mapped to Accept by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConservativeDecision {
    #[default]
    Block,
    Clarify,
}

/// The built-in detector behind a configured check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Jailbreak,
    Pii,
    Grounding,
    Contradiction,
    Relevance,
}

/// Whether a high signal raises or lowers trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    /// Higher signal means more trust (e.g. grounding coverage).
    Positive,
    /// Higher signal means less trust (e.g. contradiction risk);
    /// contribution uses (1 - signal).
    Negative,
}

/// How the aggregator treats this check when its signal is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop the check and renormalize the denominator.
    Exclude,
    /// Substitute a configured conservative default before weighting.
    Impute { default: f64 },
}

impl Default for MissingPolicy {
    fn default() -> Self {
        MissingPolicy::Exclude
    }
}

/// One configured check in the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    /// Identifier, unique within the stage.
    pub id: String,
    /// Which stage runs this check.
    pub stage: StageKind,
    /// Which built-in detector implements it.
    pub detector: DetectorKind,
    pub severity: Severity,
    /// Whether a High/Critical failure of this check halts the pipeline.
    #[serde(default)]
    pub short_circuit: bool,
    /// Aggregation weight, >= 0. Input-stage checks carry weights too but
    /// only output-stage signals feed the trust score.
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub direction: SignalDirection,
    #[serde(default)]
    pub missing_policy: MissingPolicy,
    /// Override of the pipeline-wide per-check timeout.
    pub timeout_ms: Option<u64>,
}

fn default_weight() -> f64 {
    1.0
}

/// Upstream collaborator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// OpenRouter API configuration for the model call.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub enabled: bool,
}

fn default_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}
fn default_model_timeout_secs() -> u64 {
    10
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_model_timeout_secs(),
            enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TRUSTGATE_*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> GateResult<Self> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with TRUSTGATE_ prefix
            .add_source(
                Environment::with_prefix("TRUSTGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize().map_err(GateError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration. Any failure here is fatal.
    pub fn validate(&self) -> GateResult<()> {
        self.pipeline.thresholds.validate()?;

        if !self.pipeline.score_floor.is_finite()
            || !(0.0..=1.0).contains(&self.pipeline.score_floor)
        {
            return Err(GateError::Config(format!(
                "score_floor must be in [0,1], got {}",
                self.pipeline.score_floor
            )));
        }

        for check in &self.checks {
            if check.id.is_empty() {
                return Err(GateError::Config("check id must not be empty".to_string()));
            }
            if !check.weight.is_finite() || check.weight < 0.0 {
                return Err(GateError::Config(format!(
                    "check '{}' has negative weight {}",
                    check.id, check.weight
                )));
            }
            if let MissingPolicy::Impute { default } = check.missing_policy {
                if !default.is_finite() || !(0.0..=1.0).contains(&default) {
                    return Err(GateError::Config(format!(
                        "check '{}' imputation default must be in [0,1], got {}",
                        check.id, default
                    )));
                }
            }
        }

        // Ids must be unique within a stage.
        for stage in [StageKind::Input, StageKind::Output] {
            let mut seen = std::collections::HashSet::new();
            for check in self.checks.iter().filter(|c| c.stage == stage) {
                if !seen.insert(check.id.as_str()) {
                    return Err(GateError::Config(format!(
                        "duplicate check id '{}' in {} stage",
                        check.id, stage
                    )));
                }
            }
        }

        Ok(())
    }

    /// Configured checks for one stage, in declaration order.
    pub fn checks_for(&self, stage: StageKind) -> Vec<&CheckConfig> {
        self.checks.iter().filter(|c| c.stage == stage).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            pipeline: PipelineConfig {
                thresholds: ThresholdConfig {
                    low_confidence: 0.40,
                    medium_confidence: 0.55,
                    high_confidence: 0.75,
                },
                score_floor: 0.1,
                check_timeout_ms: 2_000,
                stage_timeout_ms: 5_000,
                run_timeout_ms: 30_000,
                on_upstream_error: ConservativeDecision::Block,
                on_deadline: ConservativeDecision::Clarify,
            },
            checks: vec![CheckConfig {
                id: "grounding".to_string(),
                stage: StageKind::Output,
                detector: DetectorKind::Grounding,
                severity: Severity::Medium,
                short_circuit: false,
                weight: 2.0,
                direction: SignalDirection::Positive,
                missing_policy: MissingPolicy::Exclude,
                timeout_ms: None,
            }],
            upstream: UpstreamConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        let mut config = base_config();
        config.pipeline.thresholds.low_confidence = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("low <= medium <= high"));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = base_config();
        config.pipeline.thresholds.high_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = base_config();
        config.checks[0].weight = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("negative weight"));
    }

    #[test]
    fn test_impute_default_out_of_range_rejected() {
        let mut config = base_config();
        config.checks[0].missing_policy = MissingPolicy::Impute { default: 1.2 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_check_id_rejected() {
        let mut config = base_config();
        let dup = config.checks[0].clone();
        config.checks.push(dup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate check id"));
    }

    #[test]
    fn test_same_id_across_stages_allowed() {
        let mut config = base_config();
        let mut other = config.checks[0].clone();
        other.stage = StageKind::Input;
        config.checks.push(other);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_detector_kind_rejected_at_parse() {
        let result: Result<DetectorKind, _> = serde_json::from_str("\"telepathy\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_conservative_decision_cannot_be_accept() {
        let result: Result<ConservativeDecision, _> = serde_json::from_str("\"accept\"");
        assert!(result.is_err());
    }
}
