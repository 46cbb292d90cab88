//! Viewer connection lifecycle.
//!
//! After the upgrade, a connection is registered under its booking's
//! channel, the channel listener is ensured, and then the task sits in a
//! select loop: outbound frames queued by registry broadcasts are written
//! to the socket, and inbound frames are read solely to detect peer
//! disconnect. The first I/O failure in either direction tears the
//! connection down.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::app_state::AppState;
use crate::domain::broker_channel;

/// Runs one viewer connection until the peer disconnects or a write fails.
pub async fn run_connection(socket: WebSocket, booking_id: String, state: AppState) {
    let channel = broker_channel(&booking_id);

    let (tx, mut outbound) = mpsc::unbounded_channel();
    let id = state.connections.register(&channel, tx).await;
    // Any bid placed before this point is retrievable via the pull API, so
    // registration order relative to the listener is not load-bearing.
    state.listeners.ensure_listener(&booking_id).await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Inbound payloads are not interpreted; reads only detect
            // disconnect.
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    // Sender pruned by a failed broadcast write.
                    None => break,
                }
            }
        }
    }

    state.connections.unregister(&channel, id).await;
    debug!(%channel, id, "viewer connection closed");
}
