use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::{LlmClient, ModelProvider};
use crate::sessions::registry::SessionRegistry;
use crate::sessions::validation::JobTitleValidator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Raw provider client for audio and credential checks.
    pub llm: LlmClient,
    /// Chat models per role. Default: `OpenAiModels`.
    pub models: Arc<dyn ModelProvider>,
    /// Live interviews, keyed by session id.
    pub sessions: Arc<SessionRegistry>,
    /// Process-wide cache of job title checks.
    pub job_titles: Arc<JobTitleValidator>,
    pub config: Config,
}
