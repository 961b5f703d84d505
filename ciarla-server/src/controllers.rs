use axum::extract::ws::{Message, WebSocket};
use axum::{extract::Extension, extract::WebSocketUpgrade, http::StatusCode, response::IntoResponse, Json};
use ciarla_core::{new_connection_id, ClientEvent};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::AppState;

/// Corpo della risposta di GET /health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub connections: usize,
    /// Sessioni che hanno già inviato new-user
    pub named_sessions: usize,
}

/// Handler per GET /health
pub async fn health(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    // se il coordinatore non risponde il relay è fermo
    let stats = state.relay.stats().await.ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        connections: stats.connections,
        named_sessions: stats.named,
    }))
}

/// Handler per /ws
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = new_connection_id();

    // `tx` finisce nella Session dentro al registro: il relay lo usa per
    // mandare frame a questo client (server -> client).
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    state.relay.connect(id.clone(), tx);
    info!(connection_id = %id, "client connected");

    // Split socket into sink/stream
    let (mut sender, mut receiver) = socket.split();

    // Task: forward frames from rx -> websocket.
    // Ends when the relay drops the Session (and with it `tx`).
    let forward_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Read incoming frames and hand them to the relay
    while let Some(Ok(msg)) = receiver.next().await {
        let decoded = match &msg {
            Message::Text(t) => ClientEvent::decode(t.as_str()),
            // some clients send JSON as binary frames
            Message::Binary(data) => match std::str::from_utf8(data) {
                Ok(s) => ClientEvent::decode(s),
                Err(_) => {
                    debug!(connection_id = %id, len = data.len(), "non-UTF8 binary frame ignored");
                    continue;
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };
        match decoded {
            Ok(event) => {
                debug!(connection_id = %id, event_type = event.kind(), "event received");
                state.relay.dispatch(&id, event);
            }
            Err(e) => debug!(connection_id = %id, error = %e, "undecodable frame dropped"),
        }
    }

    // cleanup
    state.relay.disconnect(&id);
    info!(connection_id = %id, "client disconnected");
    // ensure forward task ends
    let _ = forward_task.await;
}
