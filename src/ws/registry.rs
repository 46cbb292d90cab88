//! Per-process table of live viewer connections grouped by channel.
//!
//! Each connection registers an unbounded sender for its outbound text
//! frames and gets back a stable integer handle for later removal. All
//! mutation and the broadcast write loop happen under one exclusive lock,
//! so concurrent broadcasts to a channel are serialized and dead-connection
//! pruning stays consistent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Stable handle identifying one registered connection.
pub type ConnectionId = u64;

#[derive(Debug)]
struct ConnectionEntry {
    id: ConnectionId,
    tx: UnboundedSender<String>,
}

/// Channel-keyed registry of live viewer connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    channels: Mutex<HashMap<String, Vec<ConnectionEntry>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound sender under `channel`, returning
    /// its handle. The caller must not register the same sender twice.
    pub async fn register(&self, channel: &str, tx: UnboundedSender<String>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_default()
            .push(ConnectionEntry { id, tx });
        id
    }

    /// Removes the connection with the given handle. No-op if it was
    /// already pruned by a failed broadcast write.
    pub async fn unregister(&self, channel: &str, id: ConnectionId) {
        let mut channels = self.channels.lock().await;
        if let Some(entries) = channels.get_mut(channel) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                channels.remove(channel);
            }
        }
    }

    /// Pushes `payload` to every connection registered under `channel`.
    ///
    /// A connection is dead the first time a write to it fails; dead
    /// connections are dropped from the retained set as a side effect.
    /// Never fails; returns the number of connections that accepted the
    /// frame.
    pub async fn broadcast(&self, channel: &str, payload: &str) -> usize {
        let mut channels = self.channels.lock().await;
        let Some(entries) = channels.get_mut(channel) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|entry| entry.tx.send(payload.to_string()).is_ok());
        let delivered = entries.len();

        if delivered < before {
            debug!(
                %channel,
                pruned = before - delivered,
                "dropped dead connections during broadcast"
            );
        }
        delivered
    }

    /// Number of live connections currently registered under `channel`.
    pub async fn connection_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().await;
        channels.get(channel).map_or(0, Vec::len)
    }
}
