/// LLM Client: the single point of entry for all provider calls.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Chat completions, transcription, speech synthesis and credential checks
/// all go through `LlmClient`. The interview core only sees the `ChatModel`
/// trait, so it can run against a scripted model in tests.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::transcript::{Role, Turn};

pub mod audio;
pub mod prompts;
#[cfg(test)]
pub mod testing;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Text completion capability consumed by the interviewer, tutor and reviewer.
///
/// `turns` are sent in order after the system prompt: candidate turns as
/// `user` messages, interviewer turns as `assistant` messages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, LlmError>;
}

/// Which conversational role a chat model is wanted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Interviewer,
    Tutor,
    Reviewer,
}

/// Hands out role-specific chat models bound to a session's credential.
///
/// Carried in `AppState` as `Arc<dyn ModelProvider>` so handlers can be
/// exercised against scripted models.
pub trait ModelProvider: Send + Sync {
    fn chat_model(&self, role: ModelRole, api_key: &str) -> Arc<dyn ChatModel>;
}

/// Sampling temperature for the interviewer; tutor and reviewer use the provider default.
const INTERVIEWER_TEMPERATURE: f32 = 0.7;

/// Production provider: one `LlmClient` per call site, model chosen per role.
pub struct OpenAiModels {
    pub client: LlmClient,
    pub interviewer_model: String,
    pub tutor_model: String,
    pub reviewer_model: String,
}

impl ModelProvider for OpenAiModels {
    fn chat_model(&self, role: ModelRole, api_key: &str) -> Arc<dyn ChatModel> {
        let client = self.client.with_api_key(api_key);
        match role {
            ModelRole::Interviewer => Arc::new(
                client
                    .with_model(&self.interviewer_model)
                    .with_temperature(INTERVIEWER_TEMPERATURE),
            ),
            ModelRole::Tutor => Arc::new(client.with_model(&self.tutor_model)),
            ModelRole::Reviewer => Arc::new(client.with_model(&self.reviewer_model)),
        }
    }
}

/// The provider client shared by every session.
/// Cheap to clone; per-session credentials and per-role models are derived
/// with `with_api_key` / `with_model`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl LlmClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..self.clone()
        }
    }

    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a request built by `build`, retrying on 429 and 5xx with
    /// exponential backoff. `build` is called once per attempt because
    /// multipart bodies cannot be replayed.
    async fn send<F>(&self, build: F) -> Result<Response, LlmError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = build(&self.client).bearer_auth(&self.api_key).send().await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OpenAiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Makes a raw chat completion call, returning the full response object.
    pub async fn call(&self, system: &str, turns: &[Turn]) -> Result<ChatResponse, LlmError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
        messages.extend(turns.iter().map(|t| ChatMessage {
            role: provider_role(t.role),
            content: &t.content,
        }));

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .send(|client| {
                client
                    .post(format!("{OPENAI_API_BASE}/chat/completions"))
                    .json(&request_body)
            })
            .await?;

        let chat_response: ChatResponse = response.json().await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                self.model(),
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat_response)
    }

    /// Cheap authentication check: lists models with the configured key.
    pub async fn verify_credentials(&self) -> Result<(), LlmError> {
        self.send(|client| client.get(format!("{OPENAI_API_BASE}/models")))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, LlmError> {
        let response = self.call(system, turns).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn provider_role(role: Role) -> &'static str {
    match role {
        Role::Candidate => "user",
        Role::Interviewer => "assistant",
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_chat_request_maps_roles_and_skips_missing_temperature() {
        let turns = [Turn::candidate("hi"), Turn::interviewer("hello")];
        let mut messages = vec![ChatMessage {
            role: "system",
            content: "sys",
        }];
        messages.extend(turns.iter().map(|t| ChatMessage {
            role: provider_role(t.role),
            content: &t.content,
        }));
        let request = ChatRequest {
            model: "m",
            messages,
            temperature: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][2]["role"], "assistant");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn test_chat_response_text_ignores_empty_content() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": ""}}],
            "usage": null
        }))
        .unwrap();
        assert!(response.text().is_none());

        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "Tell me about yourself."}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }))
        .unwrap();
        assert_eq!(response.text(), Some("Tell me about yourself."));
    }

    #[test]
    fn test_derived_clients_keep_other_settings() {
        let base = LlmClient::new("sk-default".to_string(), "gpt-4o-mini").with_temperature(0.7);
        let derived = base.with_api_key("sk-session").with_model("gpt-5-nano");
        assert_eq!(derived.model(), "gpt-5-nano");
        assert_eq!(derived.api_key, "sk-session");
        assert_eq!(derived.temperature, Some(0.7));
        assert_eq!(base.api_key, "sk-default");
    }
}
