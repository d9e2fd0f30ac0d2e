//! HTTP routing
//!
//! Two surfaces: the rates page at `/` and the push channel upgrade at
//! `/ws`. Authentication happens before the upgrade, so a rejected
//! attempt is observable as a plain 401 response and never as a
//! silently-open channel.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::debug;

use crate::gate::{ConnectionGate, SessionContext};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<ConnectionGate>,
}

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO));

    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .layer(trace_layer)
        .with_state(state)
}

/// Rates page; opens the WebSocket on load
async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Push channel upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let ctx = SessionContext::from_headers(&headers);

    if state.gate.authorize(&ctx).is_err() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Per-connection task: forward queued events into the socket until
/// either side closes
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = state.gate.admit(tx);
    let id = conn.id;

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            queued = rx.recv() => match queued {
                Some(msg) => {
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
                None => {
                    // Registry dropped the sender (shutdown or failed
                    // send); close the socket cleanly
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Clients only listen; anything else is ignored
                Some(Ok(other)) => debug!("Ignoring client frame: {other:?}"),
            },
        }
    }

    state.gate.disconnect(&id);
}
