//! WebSocket endpoint streaming file change events.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use super::handlers::AppState;
use crate::hub::{channel_connection, DEFAULT_CLIENT_BUFFER};

/// GET /ws/watch - Upgrade and subscribe to change broadcasts.
pub async fn watch_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (connection, mut rx) = channel_connection(DEFAULT_CLIENT_BUFFER);
    let conn_id = connection.id();

    if let Err(e) = state.hub.connect(connection).await {
        tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket handshake failed");
        return;
    }

    // Dropping `rx` when the socket fails makes the hub prune this client.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode change event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        tokio::select! {
            () = state.shutdown.cancelled() => break,
            _ = &mut writer => break,
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                // Inbound frames only keep the connection alive.
                Some(Ok(_)) => {}
            },
        }
    }

    state.hub.disconnect(conn_id).await;
    writer.abort();
}
