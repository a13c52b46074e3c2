//! Conversation engine for streamchat.
//!
//! Provides:
//! - The `AiClient` seam: role-tagged messages in, lazy text fragments out
//! - An OpenAI-compatible Chat Completions client with SSE streaming
//! - `Session`, which owns the transcript and drives one streamed reply at a time
//! - Pluggable history projection (`HistoryPolicy`)

pub mod history;
pub mod openai;
pub mod session;
pub mod streaming;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use history::{FullHistory, HistoryPolicy, RecentTurns};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use session::{ChatError, Session, SessionEvent, Transcript, Turn, DEFAULT_SYSTEM_PROMPT};

/// Lazy, forward-only sequence of reply fragments. Concatenating every
/// `Ok` item in order gives the full reply; an `Err` ends the sequence.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

#[async_trait]
pub trait AiClient: Send + Sync {
    /// Model identifier every request is sent to.
    fn model(&self) -> &str;

    /// Start a streamed completion for `messages`.
    ///
    /// Errors raised before the first byte arrives are returned directly;
    /// later failures surface as an `Err` item on the stream.
    async fn stream_message(&self, messages: &[Message]) -> Result<FragmentStream, AiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Stream ended before the response was complete")]
    StreamInterrupted,
}
