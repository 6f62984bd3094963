//! Promptgate - admission control for untrusted prompts
//!
//! This service decides whether free-form caller text is safe to forward
//! to a downstream generative model and, if so, returns the generated
//! response. Fast local rule checks run first, then a cached external
//! classification with a confidence threshold, then generation.

use std::sync::Arc;

use tokio::net::TcpListener;

mod api;
mod config;
mod domain;
mod engine;
mod error;
mod executor;
mod logging;

use crate::api::build_router;
use crate::config::Config;
use crate::engine::{Classifier, DecisionPipeline, OllamaClient, ResponseGenerator, RuleFilter};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The decision pipeline.
    pub pipeline: Arc<DecisionPipeline>,
    /// LLM backend client, kept for health probes.
    pub llm: OllamaClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init();

    tracing::info!("Starting Promptgate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        llm_base_url = %config.llm.base_url,
        model = %config.llm.model,
        confidence_threshold = config.safety.confidence_threshold,
        cache_capacity = config.safety.cache_capacity,
        "Configuration loaded"
    );

    // Build the decision pipeline
    let llm = OllamaClient::new(&config.llm).map_err(|e| {
        tracing::error!(error = %e, "Failed to build LLM client");
        anyhow::anyhow!("LLM client error: {}", e)
    })?;

    let rules = RuleFilter::new(&config.safety).map_err(|e| {
        tracing::error!(error = %e, "Failed to compile rule filter");
        anyhow::anyhow!("Rule filter error: {}", e)
    })?;

    let classifier = Classifier::new(
        Arc::new(llm.clone()),
        config.safety.cache_capacity,
        config.safety.confidence_threshold,
    );
    let generator = ResponseGenerator::new(Arc::new(llm.clone()));
    let pipeline = Arc::new(DecisionPipeline::new(rules, classifier, generator));

    // Build application state and router
    let state = AppState { pipeline, llm };
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
