//! Setup validation, run before a session is created when
//! `VALIDATE_SETUP` is on.
//!
//! Job titles are looked up in a fixed table first; unknown titles are asked
//! of the model once and the answer is cached for the process lifetime.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{ChatModel, ModelRole};
use crate::models::session::SessionConfig;
use crate::models::transcript::Turn;
use crate::sessions::prompts::{JOB_TITLE_PROMPT_TEMPLATE, JOB_TITLE_SYSTEM};
use crate::state::AppState;

const KNOWN_JOB_TITLES: &[&str] = &[
    "software engineer",
    "senior software engineer",
    "backend engineer",
    "frontend engineer",
    "full stack engineer",
    "machine learning engineer",
    "data engineer",
    "data scientist",
    "data analyst",
    "data architect",
    "devops engineer",
    "site reliability engineer",
    "cloud engineer",
    "platform engineer",
    "infrastructure engineer",
    "mobile engineer",
    "ios engineer",
    "android engineer",
    "qa engineer",
    "test engineer",
    "automation engineer",
    "security engineer",
    "application security engineer",
    "network engineer",
    "systems engineer",
    "embedded systems engineer",
    "firmware engineer",
    "hardware engineer",
    "robotics engineer",
    "ai engineer",
    "nlp engineer",
    "computer vision engineer",
    "data platform engineer",
    "big data engineer",
    "etl engineer",
    "search engineer",
    "recommendation systems engineer",
    "game engineer",
    "graphics engineer",
    "build engineer",
    "release engineer",
    "reliability engineer",
    "observability engineer",
    "database engineer",
    "distributed systems engineer",
    "performance engineer",
    "storage engineer",
    "web engineer",
    "api engineer",
];

pub struct JobTitleValidator {
    checked: RwLock<HashMap<String, bool>>,
}

impl Default for JobTitleValidator {
    fn default() -> Self {
        Self {
            checked: RwLock::new(
                KNOWN_JOB_TITLES
                    .iter()
                    .map(|t| (t.to_string(), true))
                    .collect(),
            ),
        }
    }
}

impl JobTitleValidator {
    pub async fn is_valid(&self, model: &dyn ChatModel, title: &str) -> Result<bool, AppError> {
        let title = title.trim().to_lowercase();
        if let Some(&known) = self.checked.read().await.get(&title) {
            return Ok(known);
        }

        info!("Unknown job title '{title}', asking the model...");
        let prompt = JOB_TITLE_PROMPT_TEMPLATE.replace("{job_title}", &title);
        let answer = model
            .complete(JOB_TITLE_SYSTEM, &[Turn::candidate(prompt)])
            .await?;

        let valid = match answer.trim() {
            "1" => true,
            "0" => false,
            other => {
                return Err(AppError::ModelInvocation(format!(
                    "Job title check returned {other:?}, expected 0 or 1"
                )))
            }
        };

        info!("Job title '{title}' validity check: {valid}");
        self.checked.write().await.insert(title, valid);
        Ok(valid)
    }
}

/// Checks the session's credential and target position.
pub async fn validate_setup(state: &AppState, config: &SessionConfig) -> Result<(), AppError> {
    if let Err(e) = state
        .llm
        .with_api_key(&config.api_key)
        .verify_credentials()
        .await
    {
        warn!("Provider API key check failed: {e}");
        return Err(AppError::Validation(
            "The provider API key was rejected".to_string(),
        ));
    }

    let model = state
        .models
        .chat_model(ModelRole::Reviewer, &config.api_key);
    if !state
        .job_titles
        .is_valid(model.as_ref(), &config.position)
        .await?
    {
        return Err(AppError::Validation(format!(
            "'{}' is not a recognised job title",
            config.position
        )));
    }

    Ok(())
}
