//! AiClient trait implementation for OpenAiClient.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::streaming::{sse_events, SseEvent};
use crate::{AiClient, AiError, FragmentStream, Message};

use super::client::{parse_chunk, Chunk, OpenAiClient};

#[async_trait]
impl AiClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_message(&self, messages: &[Message]) -> Result<FragmentStream, AiError> {
        let body = self.build_request_body(messages);

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "OpenAI streaming request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.auth_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let events = sse_events(response.bytes_stream());
        Ok(Box::pin(completion_fragments(events)))
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::NetworkError(e.to_string())
    }
}

struct FragmentState<S> {
    events: std::pin::Pin<Box<S>>,
    saw_finish_reason: bool,
    finished: bool,
}

/// Map decoded SSE events to reply fragments.
///
/// The stream ends cleanly on `[DONE]`, or at end-of-body once a chunk has
/// carried a `finish_reason`. End-of-body without either is reported as
/// `StreamInterrupted`, so a truncated reply is never mistaken for a whole one.
pub(crate) fn completion_fragments<S>(events: S) -> impl Stream<Item = Result<String, AiError>> + Send
where
    S: Stream<Item = Result<SseEvent, AiError>> + Send,
{
    let state = FragmentState {
        events: Box::pin(events),
        saw_finish_reason: false,
        finished: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.events.next().await {
                Some(Ok(event)) => match parse_chunk(&event.data) {
                    Ok(Chunk::Done) => {
                        state.finished = true;
                        return None;
                    }
                    Ok(Chunk::Delta { content, finished }) => {
                        state.saw_finish_reason |= finished;
                        if let Some(text) = content.filter(|t| !t.is_empty()) {
                            return Some((Ok(text), state));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Bad completion chunk");
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if state.saw_finish_reason {
                        return None;
                    }
                    return Some((Err(AiError::StreamInterrupted), state));
                }
            }
        }
    })
}
