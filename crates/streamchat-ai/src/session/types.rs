//! Session events and errors.

use crate::AiError;

use super::transcript::Turn;

/// Observable progress of one submission, in emission order:
/// zero or more `Partial`, then `Complete`, then `Committed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The full reply text received so far. Each value extends the previous one.
    Partial(String),
    /// The stream ended cleanly; this is the final reply text.
    Complete(String),
    /// The reply was appended to the transcript.
    Committed(Turn),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Nothing to send")]
    EmptyInput,
    #[error("Session is busy with another request")]
    Busy,
    #[error("Provider stream error: {0}")]
    ProviderStream(#[from] AiError),
}
