mod blocking;
mod config;
mod errors;
mod interview;
mod llm_client;
mod models;
mod review;
mod routes;
mod sessions;
mod state;
mod tutor;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmClient, OpenAiModels};
use crate::routes::build_router;
use crate::sessions::registry::{spawn_idle_sweeper, SessionRegistry};
use crate::sessions::validation::JobTitleValidator;
use crate::state::AppState;

const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every setup must supply its own key");
    }

    // Initialize LLM client and per-role chat models
    let llm = LlmClient::new(
        config.openai_api_key.clone().unwrap_or_default(),
        config.interviewer_model.clone(),
    );
    let models = Arc::new(OpenAiModels {
        client: llm.clone(),
        interviewer_model: config.interviewer_model.clone(),
        tutor_model: config.tutor_model.clone(),
        reviewer_model: config.reviewer_model.clone(),
    });
    info!(
        "LLM client initialized (interviewer: {}, tutor: {}, reviewer: {})",
        config.interviewer_model, config.tutor_model, config.reviewer_model
    );

    // Session registry with idle eviction
    let sessions = Arc::new(SessionRegistry::new(config.session_idle_timeout));
    spawn_idle_sweeper(sessions.clone(), IDLE_SWEEP_INTERVAL);
    info!(
        "Session registry initialized (idle timeout: {}s)",
        config.session_idle_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        llm,
        models,
        sessions,
        job_titles: Arc::new(JobTitleValidator::default()),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
