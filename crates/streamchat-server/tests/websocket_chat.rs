//! End-to-end tests: real listener, real WebSocket client, scripted provider.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, SinkExt, StreamExt};
use serde_json::{json, Value};
use streamchat_ai::{AiClient, AiError, FragmentStream, Message};
use streamchat_config::StreamchatConfig;
use streamchat_server::{serve, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STEP: Duration = Duration::from_secs(5);

#[derive(Default)]
struct ScriptedClient {
    fragments: Vec<&'static str>,
    interrupt: bool,
    delay: Duration,
}

impl ScriptedClient {
    fn replying(fragments: &[&'static str]) -> Self {
        Self {
            fragments: fragments.to_vec(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AiClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn stream_message(&self, _messages: &[Message]) -> Result<FragmentStream, AiError> {
        let mut items: Vec<Result<String, AiError>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        if self.interrupt {
            items.push(Err(AiError::StreamInterrupted));
        }
        let delay = self.delay;
        Ok(Box::pin(stream::iter(items).then(move |item| async move {
            tokio::time::sleep(delay).await;
            item
        })))
    }
}

async fn start(client: ScriptedClient) -> (SocketAddr, AppState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(StreamchatConfig::default(), Arc::new(client));
    let served = state.clone();
    tokio::spawn(async move { serve(listener, served).await.unwrap() });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Frame::Text(value.to_string().into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Value {
    let next = async {
        loop {
            match ws.next().await {
                Some(Ok(Frame::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended: {other:?}"),
            }
        }
    };
    timeout(STEP, next).await.expect("no frame within timeout")
}

/// Collect `partial` texts until the first other frame, which is returned too.
async fn read_partials(ws: &mut Ws) -> (Vec<String>, Value) {
    let mut partials = Vec::new();
    loop {
        let frame = recv(ws).await;
        if frame["type"] != "partial" {
            return (partials, frame);
        }
        partials.push(frame["text"].as_str().unwrap().to_string());
    }
}

/// Partials may be coalesced but always grow and end on the full reply.
fn assert_growing(partials: &[String], full: &str) {
    assert!(!partials.is_empty());
    for pair in partials.windows(2) {
        assert!(pair[1].starts_with(&pair[0]), "{partials:?}");
        assert!(pair[1].len() > pair[0].len(), "{partials:?}");
    }
    assert_eq!(partials.last().unwrap(), full);
}

/// Say hello and return (session_id, visible turns).
async fn hello(ws: &mut Ws, session_id: Option<&str>) -> (String, Vec<Value>) {
    let msg = match session_id {
        Some(id) => json!({ "type": "hello", "session_id": id }),
        None => json!({ "type": "hello" }),
    };
    send(ws, msg).await;

    let ready = recv(ws).await;
    assert_eq!(ready["type"], "session_ready");
    assert_eq!(ready["model"], "scripted-model");

    let transcript = recv(ws).await;
    assert_eq!(transcript["type"], "transcript");
    (
        ready["session_id"].as_str().unwrap().to_string(),
        transcript["turns"].as_array().unwrap().clone(),
    )
}

#[tokio::test]
async fn streamed_reply_is_committed_and_resumable() {
    let (addr, state) = start(ScriptedClient::replying(&["Hi", " there", "!"])).await;
    let mut ws = connect(addr).await;

    let (session_id, turns) = hello(&mut ws, None).await;
    assert!(turns.is_empty());

    send(&mut ws, json!({ "type": "submit", "text": "Hello" })).await;
    let (partials, complete) = read_partials(&mut ws).await;
    assert_growing(&partials, "Hi there!");
    assert_eq!(complete, json!({ "type": "complete", "text": "Hi there!" }));
    assert_eq!(
        recv(&mut ws).await,
        json!({
            "type": "turn_committed",
            "turn": { "role": "assistant", "content": "Hi there!" }
        })
    );
    ws.close(None).await.unwrap();

    let mut again = connect(addr).await;
    let (resumed_id, turns) = hello(&mut again, Some(&session_id)).await;
    assert_eq!(resumed_id, session_id);
    assert_eq!(
        turns,
        vec![
            json!({ "role": "user", "content": "Hello" }),
            json!({ "role": "assistant", "content": "Hi there!" }),
        ]
    );
    assert_eq!(state.store.count().await, 1);
}

#[tokio::test]
async fn interrupted_reply_is_not_committed() {
    let (addr, _state) = start(ScriptedClient {
        interrupt: true,
        ..ScriptedClient::replying(&["Sure", ", here"])
    })
    .await;
    let mut ws = connect(addr).await;
    let (session_id, _) = hello(&mut ws, None).await;

    send(&mut ws, json!({ "type": "submit", "text": "Tell me a story" })).await;
    let (partials, transcript) = read_partials(&mut ws).await;
    assert_growing(&partials, "Sure, here");

    // The authoritative transcript comes first so the page drops the partial.
    assert_eq!(transcript["type"], "transcript");
    assert_eq!(
        transcript["turns"],
        json!([{ "role": "user", "content": "Tell me a story" }])
    );
    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().contains("before the response was complete"));
    ws.close(None).await.unwrap();

    let mut again = connect(addr).await;
    let (_, turns) = hello(&mut again, Some(&session_id)).await;
    assert_eq!(turns, vec![json!({ "role": "user", "content": "Tell me a story" })]);
}

#[tokio::test]
async fn second_tab_attaches_during_stream_and_is_told_busy() {
    let (addr, _state) = start(ScriptedClient {
        delay: Duration::from_millis(300),
        ..ScriptedClient::replying(&["f0", "f1", "f2"])
    })
    .await;

    let mut first = connect(addr).await;
    let (session_id, _) = hello(&mut first, None).await;
    send(&mut first, json!({ "type": "submit", "text": "one" })).await;
    assert_eq!(recv(&mut first).await, json!({ "type": "partial", "text": "f0" }));

    // Attaching while the first reply streams gets the last committed state.
    let mut second = connect(addr).await;
    let (resumed, turns) = timeout(Duration::from_millis(250), hello(&mut second, Some(&session_id)))
        .await
        .expect("hello blocked on the streaming session");
    assert_eq!(resumed, session_id);
    assert!(turns.is_empty());

    send(&mut second, json!({ "type": "submit", "text": "two" })).await;
    let transcript = recv(&mut second).await;
    assert_eq!(transcript["type"], "transcript");
    assert_eq!(transcript["turns"], json!([]));
    assert_eq!(
        recv(&mut second).await,
        json!({ "type": "error", "message": "Session is busy with another request" })
    );

    let (partials, complete) = read_partials(&mut first).await;
    assert_growing(&partials, "f0f1f2");
    assert_eq!(complete, json!({ "type": "complete", "text": "f0f1f2" }));
    assert_eq!(recv(&mut first).await["type"], "turn_committed");

    let mut third = connect(addr).await;
    let (_, turns) = hello(&mut third, Some(&session_id)).await;
    assert_eq!(
        turns,
        vec![
            json!({ "role": "user", "content": "one" }),
            json!({ "role": "assistant", "content": "f0f1f2" }),
        ]
    );
}

#[tokio::test]
async fn bad_frames_get_error_and_connection_stays_open() {
    let (addr, _state) = start(ScriptedClient::replying(&["ok"])).await;
    let mut ws = connect(addr).await;
    hello(&mut ws, None).await;

    ws.send(Frame::Text("{not json".to_string().into())).await.unwrap();
    assert_eq!(recv(&mut ws).await["type"], "error");

    send(&mut ws, json!({ "type": "submit", "text": "still there?" })).await;
    assert_eq!(recv(&mut ws).await, json!({ "type": "partial", "text": "ok" }));
    assert_eq!(recv(&mut ws).await["type"], "complete");
    assert_eq!(recv(&mut ws).await["type"], "turn_committed");
}

#[tokio::test]
async fn blank_submission_is_ignored() {
    let (addr, _state) = start(ScriptedClient::replying(&["pong"])).await;
    let mut ws = connect(addr).await;
    hello(&mut ws, None).await;

    send(&mut ws, json!({ "type": "submit", "text": "   " })).await;
    send(&mut ws, json!({ "type": "submit", "text": "ping" })).await;
    // The first frame back belongs to the second submission.
    assert_eq!(recv(&mut ws).await, json!({ "type": "partial", "text": "pong" }));
}

#[tokio::test]
async fn submit_before_hello_is_rejected() {
    let (addr, state) = start(ScriptedClient::replying(&["unused"])).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "submit", "text": "Hello" })).await;
    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "expected hello");
    assert_eq!(state.store.count().await, 0);
}

#[tokio::test]
async fn unknown_session_id_starts_fresh() {
    let (addr, _state) = start(ScriptedClient::replying(&["x"])).await;
    let mut ws = connect(addr).await;
    let (id, turns) = hello(&mut ws, Some("not-a-session")).await;
    assert_ne!(id, "not-a-session");
    assert!(turns.is_empty());
}

#[tokio::test]
async fn http_routes() {
    let (addr, _state) = start(ScriptedClient::default()).await;
    let base = format!("http://{addr}");

    let page = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(page.status(), reqwest::StatusCode::OK);
    let content_type = page.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = page.text().await.unwrap();
    assert!(body.contains("ChatGPT-like clone"));
    assert!(body.contains("What is up?"));

    let health = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(health.json::<Value>().await.unwrap(), json!({ "status": "ok", "sessions": 0 }));

    let missing = reqwest::get(format!("{base}/nope")).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let post = reqwest::Client::new().post(format!("{base}/")).send().await.unwrap();
    assert_eq!(post.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let plain = reqwest::get(format!("{base}/ws")).await.unwrap();
    assert!(plain.status().is_client_error());
}

#[tokio::test]
async fn bare_newline_request_is_answered_promptly() {
    let (addr, _state) = start(ScriptedClient::default()).await;

    let exchange = async {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\nHost: localhost\nConnection: close\n\n")
            .await
            .unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    };
    let response = timeout(Duration::from_secs(2), exchange)
        .await
        .expect("server did not answer");
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains(r#""status":"ok""#));
}
