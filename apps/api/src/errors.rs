use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid interview configuration. The session is never created.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The language model call failed. Nothing was recorded, so the caller may retry.
    #[error("Model invocation error: {0}")]
    ModelInvocation(String),

    /// The reviewer's output was not a well-formed verdict.
    /// `raw` keeps the model text for diagnostics.
    #[error("Review parse error: {message}")]
    ReviewParse { message: String, raw: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::ModelInvocation(e.to_string())
    }
}

impl AppError {
    /// Extra diagnostic text for the client, if the error carries any.
    pub fn details(&self) -> Option<&str> {
        match self {
            AppError::ReviewParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
            AppError::ModelInvocation(msg) => {
                tracing::error!("Model invocation error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MODEL_INVOCATION_ERROR",
                    "The language model call failed, please retry".to_string(),
                )
            }
            AppError::ReviewParse { message, raw } => {
                tracing::error!("Review parse error: {message}; raw model output: {raw}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REVIEW_PARSE_ERROR",
                    message.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = self.details() {
            error["details"] = json!(details);
        }
        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}
