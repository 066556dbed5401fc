//! Audio capabilities used by the WebSocket transport: speech-to-text for
//! candidate answers and text-to-speech for interviewer questions.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmClient, LlmError, OPENAI_API_BASE};

pub const TRANSCRIPTION_MODEL: &str = "gpt-4o-transcribe";
/// Browser recordings arrive as webm; the provider infers the codec from the name.
const TRANSCRIPTION_FILENAME: &str = "speech.webm";

pub const SPEECH_MODEL: &str = "tts-1";
const SPEECH_VOICE: &str = "alloy";
const SPEECH_FORMAT: &str = "mp3";

/// Binary frame size used when streaming synthesized audio to the client.
pub const AUDIO_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl LlmClient {
    /// Transcribes a recorded answer into text.
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String, LlmError> {
        let response = self
            .send(|client| {
                let file = Part::bytes(audio.to_vec()).file_name(TRANSCRIPTION_FILENAME);
                let form = Form::new()
                    .text("model", TRANSCRIPTION_MODEL)
                    .part("file", file);
                client
                    .post(format!("{OPENAI_API_BASE}/audio/transcriptions"))
                    .multipart(form)
            })
            .await?;

        let transcription: TranscriptionResponse = response.json().await?;
        debug!(
            "Transcribed {} bytes of audio into {} chars",
            audio.len(),
            transcription.text.len()
        );
        Ok(transcription.text)
    }

    /// Synthesizes `text` as mp3 audio.
    pub async fn synthesize_speech(&self, text: &str) -> Result<Bytes, LlmError> {
        let request_body = SpeechRequest {
            model: SPEECH_MODEL,
            voice: SPEECH_VOICE,
            input: text,
            response_format: SPEECH_FORMAT,
        };

        let response = self
            .send(|client| {
                client
                    .post(format!("{OPENAI_API_BASE}/audio/speech"))
                    .json(&request_body)
            })
            .await?;

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(audio)
    }
}
