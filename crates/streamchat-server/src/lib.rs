//! streamchat web server.
//!
//! One axum router serves the chat page and the WebSocket endpoint that
//! drives chat sessions.

pub mod app;
pub mod connection;
pub mod page;
pub mod protocol;
pub mod store;

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use app::{initialize, AppState, ServerError};
pub use protocol::{ClientMessage, ServerMessage};
pub use store::SessionStore;

const REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Routes: `/` is the chat page, `/healthz` reports liveness, `/ws` is the chat socket.
/// Unknown paths get 404 and other methods 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

/// Serve `router(state)` on `listener` until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await
}

/// Periodically drop sessions idle longer than `ttl`.
pub fn spawn_reaper(store: SessionStore, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(REAPER_INTERVAL).await;
            let reaped = store.reap_stale(ttl).await;
            let count = store.count().await;
            tracing::debug!(reaped, sessions = count, "Reaper tick");
        }
    })
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page().to_string())
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.store.count().await,
    }))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    tracing::debug!(peer = %addr, "WebSocket upgrade");
    ws.on_upgrade(move |socket| connection::handle_connection(socket, addr, state))
        .into_response()
}
