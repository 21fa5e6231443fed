// src/llm.rs
//! Seams to the hosted model: text generation for chat, plus the speech pair.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Prompt blocked: {0}")]
    Blocked(String),
    #[error("Response contained no text")]
    EmptyResponse,
    #[error("Audio error: {0}")]
    Audio(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Http(e.without_url())
    }
}

/// One completed exchange as the model saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub prompt: String,
    pub reply: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` after replaying `history` and return the reply text.
    async fn generate(&self, history: &[ChatTurn], prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `text`, returning a playable WAV file.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LlmError>;
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, LlmError>;
}
