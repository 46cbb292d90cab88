//! In-process ledger and broker backends.
//!
//! Same contracts as the Redis backends, selectable with
//! `STORE_BACKEND=memory` for single-process development. Cross-process
//! fan-out obviously does not apply. These backends also drive the unit
//! tests for the fan-out pipeline.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::{Mutex, broadcast};
use tracing::warn;

use super::{BidBroker, BidLedger, BrokerError, MessageStream, StoreError};
use crate::domain::{Bid, ledger_key};

/// One booking's retained entries plus the sliding expiration deadline.
#[derive(Debug)]
struct BidList {
    expires_at: Instant,
    entries: Vec<Vec<u8>>,
}

/// In-memory ledger with the same sliding-TTL semantics as the Redis lists.
#[derive(Debug)]
pub struct MemoryBidLedger {
    ttl: Duration,
    lists: Mutex<HashMap<String, BidList>>,
}

impl MemoryBidLedger {
    /// Creates an empty ledger with the given retention window.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            lists: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BidLedger for MemoryBidLedger {
    async fn append(&self, booking_id: &str, bid: &Bid) -> Result<(), StoreError> {
        let key = ledger_key(booking_id);
        let payload = serde_json::to_vec(bid)?;
        let now = Instant::now();

        let mut lists = self.lists.lock().await;
        let list = lists.entry(key).or_insert_with(|| BidList {
            expires_at: now,
            entries: Vec::new(),
        });
        // An append after expiry starts a fresh list; earlier entries are
        // unobservable.
        if list.expires_at <= now {
            list.entries.clear();
        }
        list.entries.push(payload);
        list.expires_at = now + self.ttl;
        Ok(())
    }

    async fn list(&self, booking_id: &str) -> Result<Vec<Bid>, StoreError> {
        let key = ledger_key(booking_id);
        let now = Instant::now();

        let mut lists = self.lists.lock().await;
        let Some(list) = lists.get(&key) else {
            return Ok(Vec::new());
        };
        if list.expires_at <= now {
            lists.remove(&key);
            return Ok(Vec::new());
        }

        let mut bids = Vec::with_capacity(list.entries.len());
        for entry in &list.entries {
            match serde_json::from_slice::<Bid>(entry) {
                Ok(bid) => bids.push(bid),
                Err(err) => warn!(%key, error = %err, "dropping malformed ledger entry"),
            }
        }
        Ok(bids)
    }
}

/// In-process broker backed by one `tokio::broadcast` channel per topic.
pub struct MemoryBidBroker {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl MemoryBidBroker {
    /// Creates a broker whose per-channel ring buffers hold `capacity`
    /// messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscriptions on `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().await;
        channels
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Publishes an already-serialized payload, bypassing the [`Bid`] type.
    ///
    /// This is the raw injection point the trait impl builds on; it also
    /// lets tests exercise how subscribers handle payloads that do not
    /// deserialize.
    pub async fn publish_raw(&self, channel: &str, payload: Vec<u8>) {
        // A send with no live receivers is a dropped message, which matches
        // the broker contract.
        let _ = self.sender(channel).await.send(payload);
    }
}

impl fmt::Debug for MemoryBidBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBidBroker")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BidBroker for MemoryBidBroker {
    async fn publish(&self, channel: &str, bid: &Bid) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(bid)?;
        self.publish_raw(channel, payload).await;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError> {
        let rx = self.sender(channel).await.subscribe();

        let stream = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => return Some((payload, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber lagged behind broker ring buffer");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}
