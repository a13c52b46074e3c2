//! Conversation session management.
//!
//! A `Session` owns the transcript for one chat, projects it to provider
//! messages, and drives one streamed reply at a time, committing the reply
//! only when the stream ends cleanly.

mod chat;
mod manager;
mod transcript;
mod types;


pub use manager::{Session, DEFAULT_SYSTEM_PROMPT};
pub use transcript::{Transcript, Turn};
pub use types::{ChatError, SessionEvent};
