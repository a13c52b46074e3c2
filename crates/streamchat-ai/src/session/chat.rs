//! The submit loop: append, project, stream, commit.

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::AiClient;

use super::manager::Session;
use super::types::{ChatError, SessionEvent};

impl Session {
    /// Send one user message and stream the assistant's reply.
    ///
    /// The user turn is appended before the provider is called and stays in
    /// the transcript whatever happens next. `on_event` sees every partial
    /// buffer as it grows. The assistant turn is appended only after the
    /// stream ends cleanly; on any stream error the partial text is dropped
    /// and `ChatError::ProviderStream` is returned.
    ///
    /// Blank input is rejected with `EmptyInput` without touching the
    /// transcript or the provider.
    pub async fn submit<F>(
        &mut self,
        client: &dyn AiClient,
        user_message: impl Into<String>,
        mut on_event: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(SessionEvent) + Send,
    {
        let user_message = user_message.into();
        if user_message.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        self.transcript.push_user(user_message);

        let messages = self.build_messages();
        debug!(
            model = %client.model(),
            sent = messages.len(),
            history = self.transcript.len(),
            "Streaming completion"
        );

        let mut fragments = client.stream_message(&messages).await.map_err(|e| {
            warn!(error = %e, "Completion request failed");
            ChatError::ProviderStream(e)
        })?;

        let mut buffer = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment.map_err(|e| {
                warn!(error = %e, received = buffer.len(), "Completion stream failed, discarding partial reply");
                ChatError::ProviderStream(e)
            })?;
            // An empty fragment would only repeat the previous partial.
            if fragment.is_empty() {
                continue;
            }
            buffer.push_str(&fragment);
            on_event(SessionEvent::Partial(buffer.clone()));
        }

        on_event(SessionEvent::Complete(buffer.clone()));
        let turn = self.transcript.push_assistant(buffer.clone()).clone();
        on_event(SessionEvent::Committed(turn));

        debug!(chars = buffer.len(), history = self.transcript.len(), "Reply committed");
        Ok(buffer)
    }
}
