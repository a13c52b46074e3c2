//! Turns and the append-only transcript.

use serde::{Deserialize, Serialize};

use crate::{Message, Role};

/// One role-tagged entry in the conversation.
///
/// Fields are private: a turn cannot be edited once it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Message {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

impl From<Message> for Turn {
    fn from(message: Message) -> Self {
        Turn {
            role: message.role,
            content: message.content,
        }
    }
}

/// Ordered conversation history. Insertion order is conversation order.
///
/// Starts with exactly one system turn and only ever grows at the end.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn seeded(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, system_prompt)],
        }
    }

    pub(crate) fn push_user(&mut self, content: String) {
        self.turns.push(Turn::new(Role::User, content));
    }

    pub(crate) fn push_assistant(&mut self, content: String) -> &Turn {
        self.turns.push(Turn::new(Role::Assistant, content));
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Turns shown to the user; the system seed is hidden.
    pub fn visible(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| !t.is_system())
    }
}
