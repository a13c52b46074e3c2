//! History projection: which part of the transcript is sent to the provider.
//!
//! A policy only decides what goes into a request. The transcript itself is
//! never trimmed.

use std::fmt;

use crate::session::Turn;
use crate::Message;

pub trait HistoryPolicy: Send + Sync + fmt::Debug {
    /// Build the provider messages for `turns`, preserving their order.
    fn project(&self, turns: &[Turn]) -> Vec<Message>;
}

/// Send every turn, system seed included.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullHistory;

impl HistoryPolicy for FullHistory {
    fn project(&self, turns: &[Turn]) -> Vec<Message> {
        turns.iter().map(Message::from).collect()
    }
}

/// Send the leading system turns plus the most recent `max_turns` others.
#[derive(Debug, Clone, Copy)]
pub struct RecentTurns {
    max_turns: usize,
}

impl RecentTurns {
    /// `max_turns` is clamped to at least 1 so the latest user turn is always sent.
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl HistoryPolicy for RecentTurns {
    fn project(&self, turns: &[Turn]) -> Vec<Message> {
        let seed = turns.iter().take_while(|t| t.is_system()).count();
        let rest = &turns[seed..];
        let skip = rest.len().saturating_sub(self.max_turns);

        turns[..seed]
            .iter()
            .chain(rest[skip..].iter())
            .map(Message::from)
            .collect()
    }
}
