//! WebSocket handler for live reload.
//!
//! Registers each connection as a hub session and forwards reload signals
//! to the browser as text frames.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;

use super::hub::NotificationHub;

/// Handle WebSocket upgrade for live reload.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(hub): State<NotificationHub>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, hub: NotificationHub) {
    // Dropping the session on any exit path deregisters it
    let mut session = hub.add_session();

    loop {
        tokio::select! {
            // Forward reload signals to client
            signal = session.recv() => {
                let Some(signal) = signal else {
                    // Hub dropped us or shut down
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if socket.send(Message::Text(signal.as_str().into())).await.is_err() {
                    break;
                }
            }
            // Client messages are ignored; only closure matters
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(session = %session.id(), "Live reload connection closed");
}
