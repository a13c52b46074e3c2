//! Per-connection handler: hello, attach, then run submissions one at a time.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use streamchat_ai::{ChatError, SessionEvent};
use streamchat_common::SessionId;
use tokio::sync::watch;

use crate::app::AppState;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::store::Attached;

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// Handle a single WebSocket connection.
pub async fn handle_connection(ws: WebSocket, addr: SocketAddr, state: AppState) {
    let (mut sink, mut stream) = ws.split();

    // 1. Hello identifies (or requests) the session.
    let requested = match read_hello(&mut stream, addr).await {
        Ok(requested) => requested,
        Err(reason) => {
            let _ = send_message(&mut sink, &ServerMessage::error(reason)).await;
            return;
        }
    };

    let attached = state.store.attach(requested).await;
    tracing::info!(
        peer = %addr,
        session = %attached.id,
        resumed = attached.resumed,
        "Client attached"
    );

    // 2. Session id, model, and the visible history. The snapshot never
    // waits on a reply another connection is streaming.
    let ready = ServerMessage::SessionReady {
        session_id: attached.id.clone(),
        model: state.client.model().to_string(),
    };
    if send_message(&mut sink, &ready).await.is_err()
        || send_transcript(&mut sink, &attached).await.is_err()
    {
        return;
    }

    // 3. Submissions, strictly in order.
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Submit { text }) => {
                    if !run_submission(&mut sink, &state, &attached, text).await {
                        break;
                    }
                }
                Ok(ClientMessage::Hello { .. }) => {
                    let msg = ServerMessage::error("already attached to a session");
                    if send_message(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(peer = %addr, error = %e, "Invalid client message");
                    let msg = ServerMessage::error(format!("invalid message: {e}"));
                    if send_message(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
            },
            Some(Ok(Message::Ping(data))) => {
                let _ = sink.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(peer = %addr, error = %e, "WS error");
                break;
            }
            _ => {}
        }
    }

    state.store.touch(&attached.id).await;
    tracing::info!(peer = %addr, session = %attached.id, "Client disconnected");
}

/// Run one submission and forward its events. Returns `false` once the
/// client is gone.
///
/// Partials are forwarded on this task while the reply streams; only the
/// latest one is kept if the socket falls behind. If the client drops
/// mid-stream the reply still runs to completion and is committed.
///
/// A rejected or failed submission is answered with the authoritative
/// `transcript` followed by an `error`.
async fn run_submission(sink: &mut WsSink, state: &AppState, attached: &Attached, text: String) -> bool {
    let Ok(mut session) = attached.session.try_lock() else {
        tracing::debug!(session = %attached.id, "Submission rejected, session busy");
        return send_failure(sink, attached, &ChatError::Busy).await;
    };
    state.store.touch(&attached.id).await;

    let (partial_tx, mut partial_rx) = watch::channel(String::new());
    let mut finals: Vec<ServerMessage> = Vec::with_capacity(2);
    let finals_out = &mut finals;

    let submission = session.submit(state.client.as_ref(), text, move |event| match event {
        SessionEvent::Partial(text) => {
            partial_tx.send_replace(text);
        }
        other => finals_out.push(ServerMessage::from(other)),
    });

    let forward = async {
        let mut connected = true;
        while partial_rx.changed().await.is_ok() {
            let text = partial_rx.borrow_and_update().clone();
            if connected && send_message(sink, &ServerMessage::Partial { text }).await.is_err() {
                tracing::debug!(session = %attached.id, "Client gone mid-stream, finishing reply");
                connected = false;
            }
        }
        connected
    };

    let (result, mut connected) = tokio::join!(submission, forward);
    attached.session.publish(&session);
    drop(session);
    state.store.touch(&attached.id).await;

    match result {
        Ok(reply) => {
            tracing::info!(session = %attached.id, chars = reply.len(), "Reply committed");
            for msg in &finals {
                if connected && send_message(sink, msg).await.is_err() {
                    connected = false;
                }
            }
        }
        Err(ChatError::EmptyInput) => {
            tracing::debug!(session = %attached.id, "Ignoring blank submission");
        }
        Err(e) => {
            tracing::warn!(session = %attached.id, error = %e, "Submission failed");
            if connected {
                connected = send_failure(sink, attached, &e).await;
            }
        }
    }

    connected
}

async fn send_failure(sink: &mut WsSink, attached: &Attached, error: &ChatError) -> bool {
    send_transcript(sink, attached).await.is_ok()
        && send_message(sink, &ServerMessage::error(error.to_string()))
            .await
            .is_ok()
}

async fn send_transcript(sink: &mut WsSink, attached: &Attached) -> Result<(), axum::Error> {
    let turns = attached.session.visible_turns();
    send_message(sink, &ServerMessage::Transcript { turns }).await
}

/// Read the first frame as a hello. Returns the requested session id, if
/// any, or a reason to close the connection.
async fn read_hello(stream: &mut WsStream, addr: SocketAddr) -> Result<Option<SessionId>, &'static str> {
    let frame = tokio::time::timeout(HELLO_TIMEOUT, stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Hello { session_id }) => {
                Ok(session_id.and_then(|id| id.parse::<SessionId>().ok()))
            }
            Ok(ClientMessage::Submit { .. }) => {
                tracing::warn!(peer = %addr, "Submit before hello");
                Err("expected hello")
            }
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid hello message");
                Err("invalid hello")
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text hello, got another frame");
            Err("expected hello")
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during hello");
            Err("connection error")
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before hello");
            Err("closed")
        }
        Err(_) => {
            tracing::warn!(peer = %addr, "Hello timeout (10s)");
            Err("hello timeout")
        }
    }
}

/// Send a ServerMessage as a JSON text frame.
async fn send_message(sink: &mut WsSink, msg: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sink.send(Message::Text(json)).await
}
