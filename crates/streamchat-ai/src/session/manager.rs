//! Session struct and transcript access.

use std::sync::Arc;

use crate::history::{FullHistory, HistoryPolicy};
use crate::Message;

use super::transcript::{Transcript, Turn};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// A conversation session: one transcript plus the policy deciding how much
/// of it the provider sees.
pub struct Session {
    /// Conversation history, seeded with the system prompt.
    pub(super) transcript: Transcript,
    /// Projection applied when building provider requests.
    pub(super) history: Arc<dyn HistoryPolicy>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::seeded(system_prompt),
            history: Arc::new(FullHistory),
        }
    }

    pub fn with_history_policy(mut self, policy: Arc<dyn HistoryPolicy>) -> Self {
        self.history = policy;
        self
    }

    pub(crate) fn build_messages(&self) -> Vec<Message> {
        self.history.project(self.transcript.turns())
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turns(&self) -> &[Turn] {
        self.transcript.turns()
    }

    /// Number of turns in history, including the system seed.
    pub fn turn_count(&self) -> usize {
        self.transcript.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("turns", &self.transcript.len())
            .field("history", &self.history)
            .finish()
    }
}
