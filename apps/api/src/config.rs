use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_INTERVIEWER_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TUTOR_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REVIEWER_MODEL: &str = "gpt-5-nano-2025-08-07";
const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 3600;

/// Application configuration loaded from environment variables.
/// Fails at startup if a variable is present but malformed.
#[derive(Clone)]
pub struct Config {
    /// Fallback provider credential for setups that do not supply their own.
    pub openai_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub interviewer_model: String,
    pub tutor_model: String,
    pub reviewer_model: String,
    /// Sessions untouched for longer than this are dropped from the registry.
    pub session_idle_timeout: Duration,
    /// Check the provider credential and job title before creating a session.
    pub validate_setup: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            interviewer_model: env_or("INTERVIEWER_MODEL", DEFAULT_INTERVIEWER_MODEL),
            tutor_model: env_or("TUTOR_MODEL", DEFAULT_TUTOR_MODEL),
            reviewer_model: env_or("REVIEWER_MODEL", DEFAULT_REVIEWER_MODEL),
            session_idle_timeout: Duration::from_secs(
                optional_env("SESSION_IDLE_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("SESSION_IDLE_TIMEOUT_SECS must be a number of seconds")?
                    .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
            ),
            validate_setup: optional_env("VALIDATE_SETUP")
                .map(|v| v.parse::<bool>())
                .transpose()
                .context("VALIDATE_SETUP must be true or false")?
                .unwrap_or(true),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
