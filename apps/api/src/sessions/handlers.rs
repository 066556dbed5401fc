//! Axum route handlers for session setup and post-interview endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ModelRole;
use crate::models::session::{InterviewType, Personality, SessionConfig};
use crate::review::ReviewVerdict;
use crate::sessions::setup::read_setup_form;
use crate::sessions::validation::validate_setup;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub name: String,
    pub position: String,
    pub years_of_experience: f64,
    pub interview_type: InterviewType,
    pub interviewer_personality: Personality,
    pub enable_voice: bool,
    pub has_cv: bool,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/setup
///
/// Validates the setup form and registers a new session. The interview
/// itself starts when the client opens the WebSocket.
pub async fn handle_setup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SetupResponse>, AppError> {
    let request = read_setup_form(multipart).await?;
    let config = SessionConfig::from_request(request, state.config.openai_api_key.as_deref())?;

    if state.config.validate_setup {
        validate_setup(&state, &config).await?;
    }

    let session = state.sessions.create(config).await;
    Ok(Json(SetupResponse {
        session_id: session.id,
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let turns = session.turn_count().await;
    let config = &session.config;

    Ok(Json(SessionSummary {
        session_id,
        name: config.name.clone(),
        position: config.position.clone(),
        years_of_experience: config.years_of_experience,
        interview_type: config.interview_type,
        interviewer_personality: config.personality,
        enable_voice: config.enable_voice,
        has_cv: !config.cv_text.trim().is_empty(),
        turns,
        created_at: session.created_at,
        last_active: session.last_active(),
    }))
}

/// GET /api/v1/sessions/:id/transcript
///
/// Plain-text transcript dump, served as a download.
pub async fn handle_download_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(session_id).await?;
    let dump = session.transcript_dump().await;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"history_{session_id}.txt\""),
            ),
        ],
        dump,
    ))
}

/// POST /api/v1/sessions/:id/review
///
/// Grades the interview so far. A malformed verdict is returned as a
/// REVIEW_PARSE_ERROR, never defaulted.
pub async fn handle_review(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ReviewVerdict>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let reviewer = state
        .models
        .chat_model(ModelRole::Reviewer, &session.config.api_key);
    let verdict = session.review(reviewer.as_ref()).await?;
    Ok(Json(verdict))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}
