//! Reviewer: grades a finished interview.
//!
//! Pure function of (transcript snapshot, applicant profile). One model call,
//! no retry. Output that is not a well-formed verdict is a hard
//! `ReviewParse` error carrying the raw model text.

pub mod prompts;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, ChatModel};
use crate::models::transcript::Turn;
use crate::review::prompts::{
    APPLICANT_PROFILE_TEMPLATE, REVIEWER_SYSTEM_TEMPLATE, REVIEW_QUERY_TEMPLATE,
};

/// Longest accepted letter grade ("A+", "B-", "F", ...).
const MAX_SCORE_CHARS: usize = 3;

/// Structured verdict. Field names on the wire match what the model is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewVerdict {
    pub score: String,
    /// 0 to 100
    #[serde(rename = "the_chances_of_getting_this_job")]
    pub hire_probability: f64,
    pub comments: String,
    #[serde(rename = "what_to_improve")]
    pub improvement_suggestions: String,
}

/// The parts of the session configuration the reviewer sees.
#[derive(Debug, Clone, Copy)]
pub struct ApplicantProfile<'a> {
    pub position: &'a str,
    pub years_of_experience: f64,
    pub cv: &'a str,
}

pub async fn review(
    model: &dyn ChatModel,
    transcript: &[Turn],
    profile: ApplicantProfile<'_>,
) -> Result<ReviewVerdict, AppError> {
    let system = REVIEWER_SYSTEM_TEMPLATE.replace("{json_only}", JSON_ONLY_INSTRUCTION);
    let query = REVIEW_QUERY_TEMPLATE
        .replace("{applicant_profile}", &render_profile(profile))
        .replace("{interview_transcript}", &render_transcript(transcript));

    info!("Calling Reviewer model over {} turns...", transcript.len());
    let started = Instant::now();
    let raw = model
        .complete(&system, &[Turn::candidate(query)])
        .await
        .map_err(|e| AppError::ModelInvocation(format!("Reviewer call failed: {e}")))?;
    info!(
        "Reviewer model call took {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    parse_verdict(&raw)
}

/// One line per turn: `"<applicant|interviewer>: <content>"`.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.review_label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_profile(profile: ApplicantProfile<'_>) -> String {
    APPLICANT_PROFILE_TEMPLATE
        .replace("{position}", profile.position)
        .replace("{yoe}", &profile.years_of_experience.to_string())
        .replace("{cv}", profile.cv.trim())
}

/// Parses and validates the reviewer's raw output.
pub fn parse_verdict(raw: &str) -> Result<ReviewVerdict, AppError> {
    let parse_error = |message: String| AppError::ReviewParse {
        message,
        raw: raw.to_string(),
    };

    let verdict: ReviewVerdict = serde_json::from_str(strip_json_fences(raw))
        .map_err(|e| parse_error(format!("Reviewer output is not a valid verdict: {e}")))?;

    let score = verdict.score.trim();
    if score.is_empty() || score.chars().count() > MAX_SCORE_CHARS {
        return Err(parse_error(format!(
            "Invalid score {:?}: expected a letter grade",
            verdict.score
        )));
    }

    if !verdict.hire_probability.is_finite() || !(0.0..=100.0).contains(&verdict.hire_probability)
    {
        return Err(parse_error(format!(
            "Hire probability {} is outside 0-100",
            verdict.hire_probability
        )));
    }

    Ok(ReviewVerdict {
        score: score.to_string(),
        ..verdict
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const VALID: &str = r#"{
        "score": "B+",
        "the_chances_of_getting_this_job": 72.5,
        "comments": "Clear examples.",
        "what_to_improve": "Quantify impact."
    }"#;

    fn profile() -> ApplicantProfile<'static> {
        ApplicantProfile {
            position: "Backend Engineer",
            years_of_experience: 3.0,
            cv: "",
        }
    }

    fn two_turns() -> Vec<Turn> {
        vec![
            Turn::candidate("I led a team of 3"),
            Turn::interviewer("Tell me more"),
        ]
    }

    #[test]
    fn test_render_transcript_labels() {
        assert_eq!(
            render_transcript(&two_turns()),
            "applicant: I led a team of 3\ninterviewer: Tell me more"
        );
    }

    #[tokio::test]
    async fn test_review_two_turn_transcript() {
        let model = ScriptedModel::with_replies([VALID]);
        let verdict = review(&model, &two_turns(), profile()).await.unwrap();

        assert_eq!(verdict.score, "B+");
        assert!((0.0..=100.0).contains(&verdict.hire_probability));
        assert_eq!(verdict.improvement_suggestions, "Quantify impact.");

        let call = model.last_call();
        let query = &call.turns[0].content;
        assert!(query.contains("* Position: Backend Engineer"));
        assert!(query.contains("Years of experience: 3"));
        assert!(query.contains("applicant: I led a team of 3\ninterviewer: Tell me more"));
        assert!(call.system.contains(JSON_ONLY_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_review_rejects_prose() {
        let model = ScriptedModel::with_replies(["The candidate did well, I'd say a B."]);
        let err = review(&model, &two_turns(), profile()).await.unwrap_err();
        match err {
            AppError::ReviewParse { raw, .. } => {
                assert_eq!(raw, "The candidate did well, I'd say a B.")
            }
            other => panic!("expected ReviewParse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_not_a_parse_error() {
        let model = ScriptedModel::new();
        model.push_failure();
        let err = review(&model, &two_turns(), profile()).await.unwrap_err();
        assert!(matches!(err, AppError::ModelInvocation(_)));
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_verdict(&fenced).unwrap().score, "B+");
    }

    #[test]
    fn test_parse_rejects_non_numeric_probability() {
        let raw = r#"{"score": "A", "the_chances_of_getting_this_job": "high",
                      "comments": "", "what_to_improve": ""}"#;
        assert!(matches!(
            parse_verdict(raw),
            Err(AppError::ReviewParse { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_probability() {
        let raw = r#"{"score": "A", "the_chances_of_getting_this_job": 140,
                      "comments": "", "what_to_improve": ""}"#;
        assert!(matches!(
            parse_verdict(raw),
            Err(AppError::ReviewParse { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_missing_and_extra_fields() {
        let missing = r#"{"score": "A", "the_chances_of_getting_this_job": 90, "comments": ""}"#;
        assert!(parse_verdict(missing).is_err());

        let extra = r#"{"score": "A", "the_chances_of_getting_this_job": 90,
                        "comments": "", "what_to_improve": "", "hire": true}"#;
        assert!(parse_verdict(extra).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_score() {
        let empty = r#"{"score": " ", "the_chances_of_getting_this_job": 50,
                        "comments": "", "what_to_improve": ""}"#;
        assert!(parse_verdict(empty).is_err());

        let essay = r#"{"score": "Excellent", "the_chances_of_getting_this_job": 50,
                        "comments": "", "what_to_improve": ""}"#;
        assert!(parse_verdict(essay).is_err());
    }

    #[test]
    fn test_parse_trims_score() {
        let raw = r#"{"score": " A- ", "the_chances_of_getting_this_job": 0,
                      "comments": "", "what_to_improve": ""}"#;
        assert_eq!(parse_verdict(raw).unwrap().score, "A-");
    }
}
