//! Conversation driver: one stateful interviewer per session.
//!
//! Flow per turn: compute index from the durable transcript → build the
//! retained-history window → call the model → record the exchange.
//!
//! The exchange is recorded only after the model answers, so a failed or
//! cancelled call leaves the transcript untouched and the same utterance can
//! be resubmitted for the same index.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::history::{model_window, RETAINED_CANDIDATE_TURNS};
use crate::interview::prompts::{
    BEHAVIORAL_SYSTEM_TEMPLATE, FRIENDLY_PERSONALITY, KICKOFF_UTTERANCE, PROFILE_TEMPLATE,
    STRICT_PERSONALITY, TECHNICAL_SYSTEM_TEMPLATE,
};
use crate::llm_client::ChatModel;
use crate::models::session::{InterviewType, Personality, SessionConfig};
use crate::models::transcript::{Transcript, Turn};

/// Interviewer output for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewerReply {
    /// 1-based exchange index, used by the client to pair answers with questions.
    pub index: usize,
    pub content: String,
}

pub struct Interviewer {
    session_id: Uuid,
    system_prompt: String,
    transcript: Transcript,
    model: Arc<dyn ChatModel>,
}

impl Interviewer {
    /// Builds the system prompt from `config` and starts with an empty transcript.
    pub fn start(session_id: Uuid, config: &SessionConfig, model: Arc<dyn ChatModel>) -> Self {
        let system_prompt = build_system_prompt(config);
        info!(
            "Interviewer ready for session {session_id} ({} / {})",
            config.interview_type, config.personality
        );
        debug!("System prompt:\n{system_prompt}");

        Self {
            session_id,
            system_prompt,
            transcript: Transcript::new(),
            model,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Sends the kickoff turn; the reply is the opening question.
    pub async fn open(&mut self) -> Result<InterviewerReply, AppError> {
        self.advance(KICKOFF_UTTERANCE).await
    }

    /// Records `utterance` and the interviewer's reply to it.
    pub async fn advance(&mut self, utterance: &str) -> Result<InterviewerReply, AppError> {
        let index = self.transcript.next_index();
        let pending = Turn::candidate(utterance);
        let window = model_window(self.transcript.turns(), &pending, RETAINED_CANDIDATE_TURNS);

        info!(
            "Calling interviewer model for session {} (index {}, {} turns in window)...",
            self.session_id,
            index,
            window.len()
        );
        let started = Instant::now();
        let reply = self
            .model
            .complete(&self.system_prompt, &window)
            .await
            .map_err(|e| AppError::ModelInvocation(format!("Interviewer call failed: {e}")))?;
        info!(
            "Interviewer model call took {:.2} seconds",
            started.elapsed().as_secs_f64()
        );

        self.transcript
            .record_exchange(utterance.to_string(), reply.clone());

        Ok(InterviewerReply {
            index,
            content: reply,
        })
    }

    /// Blocking form of [`Interviewer::advance`] for callers outside a runtime.
    #[allow(dead_code)]
    pub fn advance_blocking(&mut self, utterance: &str) -> Result<InterviewerReply, AppError> {
        crate::blocking::block_on(self.advance(utterance))?
    }
}

/// Selects the template for the interview type, fills in the personality,
/// and appends the interviewee profile.
pub fn build_system_prompt(config: &SessionConfig) -> String {
    let template = match config.interview_type {
        InterviewType::Behavioral => BEHAVIORAL_SYSTEM_TEMPLATE,
        InterviewType::Technical => TECHNICAL_SYSTEM_TEMPLATE,
    };
    let personality = match config.personality {
        Personality::Strict => STRICT_PERSONALITY,
        Personality::Friendly => FRIENDLY_PERSONALITY,
    };

    let profile = PROFILE_TEMPLATE
        .replace("{name}", &config.name)
        .replace("{position}", &config.position)
        .replace("{yoe}", &config.years_of_experience.to_string())
        .replace("{cv}", config.cv_text.trim());

    template.replace("{personality_instruction}", personality) + &profile
}
