use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const DEFAULT_POSITION: &str = "Machine Learning Engineer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewType {
    Behavioral,
    Technical,
}

impl FromStr for InterviewType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Behavioral" => Ok(InterviewType::Behavioral),
            "Technical" => Ok(InterviewType::Technical),
            other => Err(AppError::Configuration(format!(
                "Invalid interview type: {other}"
            ))),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewType::Behavioral => f.write_str("Behavioral"),
            InterviewType::Technical => f.write_str("Technical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Strict,
    Friendly,
}

impl FromStr for Personality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Personality::Strict),
            "friendly" => Ok(Personality::Friendly),
            other => Err(AppError::Configuration(format!(
                "Invalid interviewer personality: {other}"
            ))),
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Personality::Strict => f.write_str("strict"),
            Personality::Friendly => f.write_str("friendly"),
        }
    }
}

/// Raw setup values as submitted by the client, before validation.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub name: String,
    pub position: String,
    pub years_of_experience: f64,
    pub interview_type: String,
    pub interviewer_personality: String,
    pub cv_text: String,
    pub enable_voice: bool,
    pub api_key: Option<String>,
}

/// Validated, immutable configuration of one interview.
#[derive(Clone)]
pub struct SessionConfig {
    pub name: String,
    pub position: String,
    pub years_of_experience: f64,
    pub interview_type: InterviewType,
    pub personality: Personality,
    pub cv_text: String,
    pub enable_voice: bool,
    /// Provider credential used for every model call of this session.
    pub api_key: String,
}

impl SessionConfig {
    /// Validates a setup request. `default_api_key` is used when the request
    /// carries no credential of its own.
    pub fn from_request(
        request: SetupRequest,
        default_api_key: Option<&str>,
    ) -> Result<Self, AppError> {
        let interview_type: InterviewType = request.interview_type.parse()?;
        let personality: Personality = request.interviewer_personality.parse()?;

        if !request.years_of_experience.is_finite() || request.years_of_experience < 0.0 {
            return Err(AppError::Configuration(format!(
                "Invalid years of experience: {}",
                request.years_of_experience
            )));
        }

        let api_key = request
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| default_api_key.map(str::to_string))
            .ok_or_else(|| {
                AppError::Configuration("No provider API key supplied".to_string())
            })?;

        let position = match request.position.trim() {
            "" => DEFAULT_POSITION.to_string(),
            p => p.to_string(),
        };

        Ok(SessionConfig {
            name: request.name.trim().to_string(),
            position,
            years_of_experience: request.years_of_experience,
            interview_type,
            personality,
            cv_text: request.cv_text,
            enable_voice: request.enable_voice,
            api_key,
        })
    }
}

// The credential never reaches the logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("years_of_experience", &self.years_of_experience)
            .field("interview_type", &self.interview_type)
            .field("personality", &self.personality)
            .field("cv_chars", &self.cv_text.len())
            .field("enable_voice", &self.enable_voice)
            .finish_non_exhaustive()
    }
}
