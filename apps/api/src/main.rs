mod config;
mod embedding;
mod errors;
mod ingest;
mod llm_client;
mod optimization;
mod retrieval;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::build_embedder;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Optimizer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.groq_api_url.clone())?;
    info!(
        "LLM client initialized (model: {}, temperature: {})",
        llm_client::MODEL,
        llm_client::TEMPERATURE
    );

    // Initialize embedder
    let embedder = build_embedder(&config, reqwest::Client::new()).await?;

    let state = AppState::new(config.clone(), embedder, Arc::new(llm));
    info!(
        "Session ready (history limit: {}, top_k: {}, chunk size: {})",
        config.history_limit, config.retrieval_top_k, config.chunk_max_chars
    );

    // Single local user; the browser form may be served from another origin.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
