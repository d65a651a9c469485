use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Streams journal change events to the UI shell as JSON text frames.
///
/// Browsers always send `Origin` on an upgrade, so a present origin must be on
/// the CORS allow-list. Native shells may omit it. Either way the stream is
/// only opened while a session is active.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> AppResult<Response> {
    if let Some(origin) = headers.get(header::ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !state.config.is_allowed_origin(origin) {
            tracing::warn!(origin = %origin, "Rejected WebSocket upgrade from foreign origin");
            return Err(AppError::Forbidden("Origin not allowed".into()));
        }
    }

    if !state.session.current().await.is_active() {
        return Err(AppError::Unauthorized);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state)))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.journal.subscribe();

    tracing::debug!("WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        loop {
            let payload = match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode journal event");
                        continue;
                    }
                },
                // Tell the client to refetch instead of replaying what was lost.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "WebSocket subscriber lagged");
                    json!({ "type": "resync", "skipped": skipped }).to_string()
                }
                Err(RecvError::Closed) => break,
            };

            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(message = %text, "WebSocket message received");
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!("WebSocket connection closed");
}
