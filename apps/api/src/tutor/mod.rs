//! Tutor: stateless rewriting help for a single candidate answer.
//!
//! Never touches the transcript. Model output is returned exactly as
//! received; the grammar markup (`<span class="correct">`) is not validated.

pub mod prompts;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::SPOKEN_STYLE_INSTRUCTION;
use crate::llm_client::ChatModel;
use crate::models::transcript::Turn;
use crate::tutor::prompts::{ANSWER_INPUT_TEMPLATE, ANSWER_SYSTEM_TEMPLATE, GRAMMAR_SYSTEM_TEMPLATE};

#[derive(Clone)]
pub struct Tutor {
    model: Arc<dyn ChatModel>,
    grammar_system: String,
    answer_system: String,
}

impl Tutor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            grammar_system: GRAMMAR_SYSTEM_TEMPLATE.replace("{spoken_style}", SPOKEN_STYLE_INSTRUCTION),
            answer_system: ANSWER_SYSTEM_TEMPLATE.replace("{spoken_style}", SPOKEN_STYLE_INSTRUCTION),
        }
    }

    /// Rewrites `answer` with corrected grammar, changed spans wrapped in markup.
    pub async fn improve_grammar(&self, answer: &str) -> Result<String, AppError> {
        self.ask("Grammar", &self.grammar_system, answer.to_string())
            .await
    }

    /// Rewrites `answer` into a better response to `question`.
    pub async fn improve_answer(&self, question: &str, answer: &str) -> Result<String, AppError> {
        let input = ANSWER_INPUT_TEMPLATE
            .replace("{question}", question)
            .replace("{answer}", answer);
        self.ask("Answer", &self.answer_system, input).await
    }

    #[allow(dead_code)]
    pub fn improve_grammar_blocking(&self, answer: &str) -> Result<String, AppError> {
        crate::blocking::block_on(self.improve_grammar(answer))?
    }

    #[allow(dead_code)]
    pub fn improve_answer_blocking(&self, question: &str, answer: &str) -> Result<String, AppError> {
        crate::blocking::block_on(self.improve_answer(question, answer))?
    }

    async fn ask(&self, label: &str, system: &str, input: String) -> Result<String, AppError> {
        info!("Calling {label} Tutor model...");
        let started = Instant::now();
        let response = self
            .model
            .complete(system, &[Turn::candidate(input)])
            .await
            .map_err(|e| AppError::ModelInvocation(format!("{label} tutor call failed: {e}")))?;
        info!(
            "{label} Tutor model call took {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    const MALFORMED: &str = "I <span class=\"correct\">worked on a project";

    #[tokio::test]
    async fn test_improve_grammar_returns_output_unmodified() {
        let model = Arc::new(ScriptedModel::with_replies([MALFORMED]));
        let tutor = Tutor::new(model.clone());

        let out = tutor
            .improve_grammar("I used to work on a project")
            .await
            .unwrap();
        assert_eq!(out, MALFORMED);

        let call = model.last_call();
        assert!(call.system.contains("<span class=\"correct\"></span>"));
        assert!(call.system.contains(SPOKEN_STYLE_INSTRUCTION));
        assert_eq!(call.turns, vec![Turn::candidate("I used to work on a project")]);
    }

    #[tokio::test]
    async fn test_improve_answer_formats_question_block() {
        let model = Arc::new(ScriptedModel::with_replies(["  Sure, I led a team of three.  "]));
        let tutor = Tutor::new(model.clone());

        let out = tutor
            .improve_answer("Tell me about leadership.", "i lead team of 3")
            .await
            .unwrap();
        assert_eq!(out, "  Sure, I led a team of three.  ");

        let call = model.last_call();
        assert_eq!(
            call.turns[0].content,
            "Question: Tell me about leadership.\nAnswer: i lead team of 3"
        );
        assert!(call.system.contains("Return only the improved answer."));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::new());
        model.push_failure();
        let tutor = Tutor::new(model);
        assert!(matches!(
            tutor.improve_grammar("hello").await,
            Err(AppError::ModelInvocation(_))
        ));
    }

    #[test]
    fn test_blocking_forms_match_async() {
        let replies = ["fixed grammar", "better answer"];

        let tutor = Tutor::new(Arc::new(ScriptedModel::with_replies(replies)));
        let blocking = (
            tutor.improve_grammar_blocking("x").unwrap(),
            tutor.improve_answer_blocking("q", "a").unwrap(),
        );

        let tutor = Tutor::new(Arc::new(ScriptedModel::with_replies(replies)));
        let awaited = crate::blocking::block_on(async {
            (
                tutor.improve_grammar("x").await.unwrap(),
                tutor.improve_answer("q", "a").await.unwrap(),
            )
        })
        .unwrap();

        assert_eq!(blocking, awaited);
    }
}
