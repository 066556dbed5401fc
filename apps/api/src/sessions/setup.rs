//! Reads the interview setup form (multipart) into a `SetupRequest`.
//!
//! CV text is pulled out of the uploaded PDF with `pdf-extract`. A CV that
//! cannot be read is logged and treated as empty; it never fails setup.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::session::{SetupRequest, DEFAULT_POSITION};

const DEFAULT_PERSONALITY: &str = "friendly";

/// Raw multipart fields, all optional until `into_request` checks them.
#[derive(Debug, Default)]
struct SetupFields {
    name: Option<String>,
    position: Option<String>,
    years_of_experience: Option<String>,
    interview_type: Option<String>,
    interviewer_personality: Option<String>,
    api_key: Option<String>,
    enable_voice: Option<String>,
    cv: Option<Bytes>,
}

pub async fn read_setup_form(mut multipart: Multipart) -> Result<SetupRequest, AppError> {
    let mut fields = SetupFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed setup form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let read_err = |e| AppError::Validation(format!("Could not read field '{name}': {e}"));
        match name.as_str() {
            "cv" => {
                let data = field.bytes().await.map_err(read_err)?;
                if !data.is_empty() {
                    fields.cv = Some(data);
                }
            }
            "name" => fields.name = Some(field.text().await.map_err(read_err)?),
            "position" => fields.position = Some(field.text().await.map_err(read_err)?),
            "years_of_experience" => {
                fields.years_of_experience = Some(field.text().await.map_err(read_err)?)
            }
            "interview_type" => fields.interview_type = Some(field.text().await.map_err(read_err)?),
            "interviewer_personality" => {
                fields.interviewer_personality = Some(field.text().await.map_err(read_err)?)
            }
            "openai_api_key" => fields.api_key = Some(field.text().await.map_err(read_err)?),
            "enable_voice" => fields.enable_voice = Some(field.text().await.map_err(read_err)?),
            other => warn!("Ignoring unknown setup field '{other}'"),
        }
    }

    let cv_text = match fields.cv.take() {
        Some(pdf) => extract_cv_text(pdf).await,
        None => String::new(),
    };

    fields.into_request(cv_text)
}

impl SetupFields {
    fn into_request(self, cv_text: String) -> Result<SetupRequest, AppError> {
        let name = required(self.name, "name")?;
        let interview_type = required(self.interview_type, "interview_type")?;
        let years_raw = required(self.years_of_experience, "years_of_experience")?;
        let years_of_experience = years_raw.trim().parse::<f64>().map_err(|_| {
            AppError::Validation(format!(
                "years_of_experience must be a number, got '{years_raw}'"
            ))
        })?;
        let enable_voice = match self.enable_voice.as_deref() {
            None => true,
            Some(raw) => parse_flag(raw).ok_or_else(|| {
                AppError::Validation(format!("enable_voice must be a boolean, got '{raw}'"))
            })?,
        };

        Ok(SetupRequest {
            name,
            position: self
                .position
                .unwrap_or_else(|| DEFAULT_POSITION.to_string()),
            years_of_experience,
            interview_type,
            interviewer_personality: self
                .interviewer_personality
                .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string()),
            cv_text,
            enable_voice,
            api_key: self.api_key,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field '{field}'")))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_cv_text(pdf: Bytes) -> String {
    let size = pdf.len();
    let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf)).await;

    match result {
        Ok(Ok(text)) => {
            info!("Extracted {} chars of CV text from {size} byte PDF", text.len());
            text
        }
        Ok(Err(e)) => {
            warn!("Error parsing CV: {e}");
            String::new()
        }
        Err(e) => {
            warn!("CV extraction task failed: {e}");
            String::new()
        }
    }
}
