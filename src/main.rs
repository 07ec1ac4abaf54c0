//! Trustgate - Guardrail Pipeline for LLM Responses
//!
//! Mediates one query/response exchange with a language model: input safety
//! checks, evidence retrieval, model call, output quality checks, trust
//! scoring, and a terminal release decision. Every run is persisted for audit.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;

mod config;
mod detectors;
mod domain;
mod engine;
mod error;
mod logging;
mod storage;
mod upstream;

use crate::config::Config;
use crate::domain::{Evidence, StageKind};
use crate::engine::{
    CheckAdapter, DecisionPolicy, GuardrailPipeline, StageRunner, TrustAggregator,
};
use crate::storage::AuditRepository;
use crate::upstream::{CannedModel, MemoryRetriever, ModelClient, OpenRouterModel, Retriever};

/// Assemble the stage runners from the configured check registry.
fn build_stage(config: &Config, stage: StageKind) -> anyhow::Result<StageRunner> {
    let mut adapters = Vec::new();
    for check in config.checks_for(stage) {
        let detector = detectors::build(check.detector)?;
        adapters.push(Arc::new(CheckAdapter::new(
            check,
            config.pipeline.check_timeout(),
            detector,
        )));
        tracing::debug!(check = %check.id, stage = %stage, "Check registered");
    }
    Ok(StageRunner::new(
        stage,
        adapters,
        config.pipeline.stage_timeout(),
    ))
}

fn demo_corpus() -> Vec<Evidence> {
    vec![
        Evidence::new(
            "geography/fr",
            "Paris is the capital of France and its largest city.",
        ),
        Evidence::new(
            "geography/at",
            "Vienna is the capital of Austria, on the Danube river.",
        ),
        Evidence::new(
            "science/water",
            "Water boils at 100 degrees Celsius at sea level pressure.",
        ),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Trustgate v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        database = %config.database.url,
        checks = config.checks.len(),
        model_enabled = config.upstream.openrouter.enabled,
        "Configuration loaded"
    );

    let pool = SqlitePool::connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    let repository = AuditRepository::new(pool);
    repository.init_schema().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    let input_stage = build_stage(&config, StageKind::Input)?;
    let output_stage = build_stage(&config, StageKind::Output)?;

    let retriever: Arc<dyn Retriever> = Arc::new(MemoryRetriever::new(demo_corpus()));

    let model: Arc<dyn ModelClient> = if config.upstream.openrouter.enabled {
        tracing::info!(model = %config.upstream.openrouter.model, "OpenRouter model enabled");
        Arc::new(OpenRouterModel::new(config.upstream.openrouter.clone())?)
    } else {
        tracing::info!("OpenRouter disabled; using canned model");
        Arc::new(CannedModel::default())
    };

    let pipeline = GuardrailPipeline::new(
        input_stage,
        output_stage,
        retriever,
        model,
        TrustAggregator::from_config(&config),
        DecisionPolicy::new(config.pipeline.thresholds)?,
        config.pipeline.run_timeout(),
        config.pipeline.on_upstream_error,
        config.pipeline.on_deadline,
    );

    let query = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    if query.is_empty() {
        anyhow::bail!("Usage: trustgate <query text>");
    }

    let run = pipeline.evaluate(&query).await;
    repository.insert_run(&run).await?;

    println!("run_id:   {}", run.id);
    println!("decision: {} (rule: {})", run.decision.label, run.decision.rule);
    if let Some(score) = &run.trust_score {
        println!("trust:    {:.3}", score.value);
    }
    match run.released_response() {
        Some(response) => println!("response: {}", response),
        None => {
            if let Some(message) = run.decision.user_message() {
                println!("message:  {}", message);
            }
        }
    }

    Ok(())
}
