//! Server-Sent Events (SSE) stream decoder.
//!
//! Streaming completion APIs deliver token-by-token responses as SSE.
//! This module turns any byte stream (typically `reqwest::Response::bytes_stream`)
//! into a lazy stream of parsed events.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data; multiple `data:` lines are joined with `\n`.
    pub data: String,
}

type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

struct SseDecoder {
    lines: Lines<BufReader<StreamReader<ByteStream, Bytes>>>,
    current_event: Option<String>,
    current_data: String,
    done: bool,
}

impl SseDecoder {
    async fn next_event(&mut self) -> Result<Option<SseEvent>, AiError> {
        if self.done {
            return Ok(None);
        }

        loop {
            let line = match self.lines.next_line().await {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Err(AiError::NetworkError(e.to_string()));
                }
            };

            let Some(line) = line else {
                // Flush any remaining event
                self.done = true;
                if self.current_data.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_event()));
            };

            if line.is_empty() {
                // Empty line = end of event
                if !self.current_data.is_empty() {
                    return Ok(Some(self.take_event()));
                }
                self.current_event = None;
                continue;
            }

            if let Some(event_type) = field_value(&line, "event") {
                self.current_event = Some(event_type.to_string());
            } else if let Some(data) = field_value(&line, "data") {
                if !self.current_data.is_empty() {
                    self.current_data.push('\n');
                }
                self.current_data.push_str(data);
            }
            // Ignore other fields (id:, retry:, comments)
        }
    }

    fn take_event(&mut self) -> SseEvent {
        SseEvent {
            event: self.current_event.take(),
            data: std::mem::take(&mut self.current_data),
        }
    }
}

/// `name: value` or `name:value`; one leading space is not part of the value.
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Decode a byte stream into SSE events.
///
/// The returned stream is lazy: bytes are pulled only as events are polled.
/// A transport error is yielded once as `NetworkError` and ends the stream.
pub fn sse_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<SseEvent, AiError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let byte_stream: ByteStream = Box::pin(byte_stream.map(|result| result.map_err(std::io::Error::other)));
    let reader = BufReader::new(StreamReader::new(byte_stream));

    let decoder = SseDecoder {
        lines: reader.lines(),
        current_event: None,
        current_data: String::new(),
        done: false,
    };

    futures_util::stream::unfold(decoder, |mut decoder| async move {
        match decoder.next_event().await {
            Ok(Some(event)) => Some((Ok(event), decoder)),
            Ok(None) => None,
            Err(e) => Some((Err(e), decoder)),
        }
    })
}
