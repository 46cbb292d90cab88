//! Redis-backed ledger and broker.
//!
//! The ledger uses one Redis list per booking (`bids:<booking_id>`) with a
//! sliding expiration refreshed on every append. The broker uses Redis
//! pub/sub on `bids_channel:<booking_id>`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::warn;

use super::{BidBroker, BidLedger, BrokerError, MessageStream, StoreError};
use crate::domain::{Bid, ledger_key};

/// Redis list ledger with a sliding TTL per booking.
pub struct RedisBidLedger {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisBidLedger {
    /// Creates a ledger over an established connection.
    #[must_use]
    pub fn new(conn: ConnectionManager, ttl: Duration) -> Self {
        Self { conn, ttl }
    }
}

impl fmt::Debug for RedisBidLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBidLedger")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BidLedger for RedisBidLedger {
    async fn append(&self, booking_id: &str, bid: &Bid) -> Result<(), StoreError> {
        let key = ledger_key(booking_id);
        let payload = serde_json::to_vec(bid)?;
        let mut conn = self.conn.clone();

        let _: () = conn.rpush(&key, payload).await?;

        // A list that outlives its TTL refresh is an accepted inconsistency;
        // the append already succeeded.
        #[allow(clippy::cast_possible_wrap)]
        let ttl_secs = self.ttl.as_secs() as i64;
        if let Err(err) = conn.expire::<_, ()>(&key, ttl_secs).await {
            warn!(%key, error = %err, "failed to refresh bid list ttl");
        }
        Ok(())
    }

    async fn list(&self, booking_id: &str) -> Result<Vec<Bid>, StoreError> {
        let key = ledger_key(booking_id);
        let mut conn = self.conn.clone();

        let raw: Vec<Vec<u8>> = conn.lrange(&key, 0, -1).await?;

        let mut bids = Vec::with_capacity(raw.len());
        for entry in &raw {
            match serde_json::from_slice::<Bid>(entry) {
                Ok(bid) => bids.push(bid),
                Err(err) => warn!(%key, error = %err, "dropping malformed ledger entry"),
            }
        }
        Ok(bids)
    }
}

/// Redis pub/sub broker.
///
/// Publishing goes through the shared [`ConnectionManager`]; each
/// subscription opens its own pub/sub connection, since a Redis connection
/// in subscriber mode cannot issue other commands.
pub struct RedisBidBroker {
    client: Client,
    conn: ConnectionManager,
}

impl RedisBidBroker {
    /// Creates a broker from the client (for subscriptions) and an
    /// established connection (for publishes).
    #[must_use]
    pub fn new(client: Client, conn: ConnectionManager) -> Self {
        Self { client, conn }
    }
}

impl fmt::Debug for RedisBidBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBidBroker").finish_non_exhaustive()
    }
}

#[async_trait]
impl BidBroker for RedisBidBroker {
    async fn publish(&self, channel: &str, bid: &Bid) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(bid)?;
        let mut conn = self.conn.clone();
        let _: () = conn.publish(channel, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let stream = pubsub
            .into_on_message()
            .map(|msg| msg.get_payload_bytes().to_vec());
        Ok(Box::pin(stream))
    }
}
