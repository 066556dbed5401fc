//! Scripted `ChatModel` used by unit tests across the crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ChatModel, LlmError, ModelProvider, ModelRole};
use crate::models::transcript::Turn;

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub turns: Vec<Turn>,
}

/// Replies from a queue; once the queue is empty every call answers with
/// `"Question <n>"` where `n` counts calls from 1.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_failure(&self) {
        self.replies.lock().unwrap().push_back(Err(LlmError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        }));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("model was never called")
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, LlmError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                system: system.to_string(),
                turns: turns.to_vec(),
            });
            calls.len()
        };
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Question {call_number}")))
    }
}

/// Provider that serves the same scripted model for every role and records
/// which roles were requested.
pub struct ScriptedProvider {
    pub model: Arc<ScriptedModel>,
    roles: Mutex<Vec<ModelRole>>,
}

impl ScriptedProvider {
    pub fn new(model: Arc<ScriptedModel>) -> Self {
        Self {
            model,
            roles: Mutex::new(Vec::new()),
        }
    }

    pub fn roles(&self) -> Vec<ModelRole> {
        self.roles.lock().unwrap().clone()
    }
}

impl ModelProvider for ScriptedProvider {
    fn chat_model(&self, role: ModelRole, _api_key: &str) -> Arc<dyn ChatModel> {
        self.roles.lock().unwrap().push(role);
        self.model.clone()
    }
}
