//! WebSocket transport for a live interview.
//!
//! One connection drives one session. Messages are handled in arrival order;
//! a failed request is reported to the client as an `error` message and the
//! connection stays open.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::InterviewerReply;
use crate::llm_client::audio::AUDIO_CHUNK_SIZE;
use crate::llm_client::{ChatModel, LlmClient, ModelRole};
use crate::review::ReviewVerdict;
use crate::sessions::registry::Session;
use crate::state::AppState;
use crate::tutor::Tutor;

const INVALID_SESSION: &str = "Error: Invalid Session";
const START_AUDIO: &str = "START_AUDIO";
const END_AUDIO: &str = "END_AUDIO";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Base64-encoded recording of the candidate's answer.
    Audio { data: String },
    GrammarCheck { data: GrammarCheckData },
    GenerateAiAnswer { data: AnswerData },
    Review,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct GrammarCheckData {
    user: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct AnswerData {
    user: String,
    interviewer: String,
    index: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Interviewer {
        content: String,
        index: usize,
    },
    /// Transcribed answer, tagged with the index of the question it answers.
    User {
        content: String,
        index: usize,
    },
    GrammarCheck {
        content: String,
        index: usize,
    },
    GenerateAiAnswer {
        content: String,
        index: usize,
    },
    Review {
        content: ReviewVerdict,
    },
    Error {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

#[derive(Debug, Error)]
enum ConnectionError {
    #[error("socket error: {0}")]
    Socket(#[from] axum::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

/// Whether the receive loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Outgoing half of a connection.
#[async_trait]
trait FrameSink: Send {
    async fn send_frame(&mut self, frame: Message) -> Result<(), axum::Error>;
}

#[async_trait]
impl FrameSink for WebSocket {
    async fn send_frame(&mut self, frame: Message) -> Result<(), axum::Error> {
        self.send(frame).await
    }
}

/// GET /ws?session_id=<id>
pub async fn handle_ws(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_connection(socket, state, query.session_id))
}

async fn run_connection(mut socket: WebSocket, state: AppState, session_id: Option<String>) {
    let Some(session) = find_session(&state, session_id.as_deref()).await else {
        warn!("WebSocket rejected: invalid session id {session_id:?}");
        reject(&mut socket).await;
        return;
    };

    info!("WebSocket connected to session {}", session.id);
    let mut connection = Connection::new(socket, &state, session);

    if connection.open().await == Flow::Close {
        return;
    }

    while let Some(message) = connection.sink.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("WebSocket receive error: {e}");
                break;
            }
        };

        if connection.dispatch(&text).await == Flow::Close {
            break;
        }
    }
    info!("WebSocket disconnected from session {}", connection.session.id);
}

async fn find_session(state: &AppState, raw_id: Option<&str>) -> Option<Arc<Session>> {
    let id = Uuid::parse_str(raw_id?).ok()?;
    state.sessions.get(id).await.ok()
}

async fn reject<S: FrameSink>(sink: &mut S) {
    let _ = sink
        .send_frame(Message::Text(INVALID_SESSION.to_string()))
        .await;
    let _ = sink.send_frame(Message::Close(None)).await;
}

struct Connection<S> {
    sink: S,
    session: Arc<Session>,
    interviewer_model: Arc<dyn ChatModel>,
    reviewer_model: Arc<dyn ChatModel>,
    tutor: Tutor,
    /// Provider client bound to the session key, for speech in and out.
    audio: LlmClient,
}

impl<S: FrameSink> Connection<S> {
    fn new(sink: S, state: &AppState, session: Arc<Session>) -> Self {
        let key = session.config.api_key.as_str();
        Self {
            interviewer_model: state.models.chat_model(ModelRole::Interviewer, key),
            reviewer_model: state.models.chat_model(ModelRole::Reviewer, key),
            tutor: Tutor::new(state.models.chat_model(ModelRole::Tutor, key)),
            audio: state.llm.with_api_key(key),
            sink,
            session,
        }
    }

    /// Sends the opening question, or the latest one on reconnect.
    async fn open(&mut self) -> Flow {
        let opening = self.session.begin(self.interviewer_model.clone()).await;
        let result = match opening {
            Ok(reply) => self.send_interviewer(reply).await,
            Err(e) => Err(e.into()),
        };
        self.settle(result).await
    }

    /// Handles one client text frame.
    async fn dispatch(&mut self, text: &str) -> Flow {
        let result = self.handle_text(text).await;
        self.settle(result).await
    }

    /// Reports request errors to the client; only socket errors end the loop.
    async fn settle(&mut self, result: Result<(), ConnectionError>) -> Flow {
        match result {
            Ok(()) => Flow::Continue,
            Err(ConnectionError::Socket(e)) => {
                debug!("WebSocket send error: {e}");
                Flow::Close
            }
            Err(ConnectionError::App(e)) => match self.report(e).await {
                Ok(()) => Flow::Continue,
                Err(_) => Flow::Close,
            },
        }
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), ConnectionError> {
        let message: ClientMessage = serde_json::from_str(text)
            .map_err(|e| AppError::Validation(format!("Malformed message: {e}")))?;

        match message {
            ClientMessage::Audio { data } => self.handle_audio(&data).await,
            ClientMessage::GrammarCheck { data } => {
                let content = self.tutor.improve_grammar(&data.user).await?;
                self.send_json(&ServerMessage::GrammarCheck {
                    content,
                    index: data.index,
                })
                .await
            }
            ClientMessage::GenerateAiAnswer { data } => {
                let content = self
                    .tutor
                    .improve_answer(&data.interviewer, &data.user)
                    .await?;
                self.send_json(&ServerMessage::GenerateAiAnswer {
                    content,
                    index: data.index,
                })
                .await
            }
            ClientMessage::Review => {
                let verdict = self.session.review(self.reviewer_model.as_ref()).await?;
                self.send_json(&ServerMessage::Review { content: verdict })
                    .await
            }
            ClientMessage::Unknown => {
                warn!("Ignoring unknown message type: {text}");
                Ok(())
            }
        }
    }

    async fn handle_audio(&mut self, data: &str) -> Result<(), ConnectionError> {
        let audio = STANDARD
            .decode(data)
            .map_err(|e| AppError::Validation(format!("Audio is not valid base64: {e}")))?;

        let utterance = self.audio.transcribe(&audio).await.map_err(AppError::from)?;
        info!("Session {} candidate said: {utterance}", self.session.id);
        self.answer(&utterance).await
    }

    /// Echoes the answer under the index of the question it answers, then
    /// sends the next question. The session stays locked in between, so no
    /// other connection can move the index.
    async fn answer(&mut self, utterance: &str) -> Result<(), ConnectionError> {
        let session = self.session.clone();
        let slot = session.answer_slot().await?;

        self.send_json(&ServerMessage::User {
            content: utterance.to_string(),
            index: slot.question_index(),
        })
        .await?;

        let reply = slot.advance(utterance).await?;
        self.send_interviewer(reply).await
    }

    async fn send_interviewer(&mut self, reply: InterviewerReply) -> Result<(), ConnectionError> {
        let speech = if self.session.config.enable_voice {
            Some(self.audio.synthesize_speech(&reply.content).await)
        } else {
            None
        };

        self.send_json(&ServerMessage::Interviewer {
            content: reply.content,
            index: reply.index,
        })
        .await?;

        match speech {
            Some(Ok(audio)) => self.stream_audio(&audio).await,
            Some(Err(e)) => Err(AppError::from(e).into()),
            None => Ok(()),
        }
    }

    async fn stream_audio(&mut self, audio: &[u8]) -> Result<(), ConnectionError> {
        self.sink
            .send_frame(Message::Text(START_AUDIO.to_string()))
            .await?;
        for frame in audio_frames(audio) {
            self.sink.send_frame(Message::Binary(frame)).await?;
        }
        self.sink
            .send_frame(Message::Text(END_AUDIO.to_string()))
            .await?;
        Ok(())
    }

    async fn report(&mut self, error: AppError) -> Result<(), ConnectionError> {
        warn!("Session {} request failed: {error}", self.session.id);
        self.send_json(&ServerMessage::Error {
            content: error.to_string(),
            details: error.details().map(str::to_string),
        })
        .await
    }

    async fn send_json(&mut self, message: &ServerMessage) -> Result<(), ConnectionError> {
        let text = encode(message)?;
        self.sink.send_frame(Message::Text(text)).await?;
        Ok(())
    }
}

fn encode(message: &ServerMessage) -> Result<String, AppError> {
    serde_json::to_string(message)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode message: {e}")))
}

fn audio_frames(audio: &[u8]) -> impl Iterator<Item = Vec<u8>> + '_ {
    audio.chunks(AUDIO_CHUNK_SIZE).map(<[u8]>::to_vec)
}
