//! Chat wire protocol: JSON text frames tagged on `type`.

use serde::{Deserialize, Serialize};
use streamchat_ai::{SessionEvent, Turn};
use streamchat_common::SessionId;

/// Messages a browser sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// First frame on every connection. A known `session_id` resumes that
    /// session; anything else starts a new one.
    #[serde(rename = "hello")]
    Hello {
        #[serde(default)]
        session_id: Option<String>,
    },

    #[serde(rename = "submit")]
    Submit { text: String },
}

/// Messages the server sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "session_ready")]
    SessionReady { session_id: SessionId, model: String },

    /// Every visible (non-system) turn, oldest first.
    #[serde(rename = "transcript")]
    Transcript { turns: Vec<Turn> },

    /// Reply text received so far.
    #[serde(rename = "partial")]
    Partial { text: String },

    #[serde(rename = "complete")]
    Complete { text: String },

    /// The assistant turn now stored in the transcript.
    #[serde(rename = "turn_committed")]
    TurnCommitted { turn: Turn },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Partial(text) => ServerMessage::Partial { text },
            SessionEvent::Complete(text) => ServerMessage::Complete { text },
            SessionEvent::Committed(turn) => ServerMessage::TurnCommitted { turn },
        }
    }
}
