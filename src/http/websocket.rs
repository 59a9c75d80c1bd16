//! WebSocket echo.
//!
//! # Data Flow
//! ```text
//! Client ── frame ──▶ recv ──▶ prefix ──▶ send ──▶ Client
//! ```
//!
//! One message in flight at a time. The loop ends on a close frame, on the
//! first read or write error, or when the client goes away.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};

use crate::http::server::AppState;
use crate::http::streams::{StreamGuard, StreamKind};

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let prefix = state.config.streaming.websocket_echo_prefix.clone();
    let streams = state.streams.clone();
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| echo_loop(socket, prefix, streams.open(StreamKind::WebSocket)))
}

/// Build the reply for one inbound frame. Control frames get no reply.
pub fn echo_reply(prefix: &str, message: Message) -> Option<Message> {
    match message {
        Message::Text(text) => Some(Message::Text(format!("{}{}", prefix, text.as_str()).into())),
        Message::Binary(payload) => {
            let mut out = Vec::with_capacity(prefix.len() + payload.len());
            out.extend_from_slice(prefix.as_bytes());
            out.extend_from_slice(&payload);
            Some(Message::Binary(out.into()))
        }
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
    }
}

/// Runs until the peer closes or goes away; `guard` is released on return.
async fn echo_loop(mut socket: WebSocket, prefix: String, mut guard: StreamGuard) {
    while let Some(received) = socket.recv().await {
        let message = match received {
            Ok(Message::Close(_)) => break,
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket read failed");
                break;
            }
        };

        let Some(reply) = echo_reply(&prefix, message) else {
            continue;
        };
        if let Err(e) = socket.send(reply).await {
            tracing::debug!(error = %e, "WebSocket write failed");
            break;
        }
        guard.record_item();
    }
}
