//! Bid ledger and fan-out broker backends.
//!
//! Two seams, both behind traits so the gateway logic never depends on a
//! concrete store:
//!
//! - [`BidLedger`] — append-only, TTL-bounded list of bids per booking. The
//!   ledger write is the durability guarantee for a submitted bid.
//! - [`BidBroker`] — publish/subscribe medium keyed by channel name, used to
//!   move a bid from the process that accepted it to every process with live
//!   viewers. Purely a latency optimization; losing a publish is acceptable
//!   because late joiners pull from the ledger.
//!
//! The default backend is Redis (lists + pub/sub); an in-memory backend is
//! selectable for development and drives the unit tests.

pub mod memory;
pub mod redis;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use tracing::info;

use crate::config::GatewayConfig;
use crate::domain::Bid;

pub use self::memory::{MemoryBidBroker, MemoryBidLedger};
pub use self::redis::{RedisBidBroker, RedisBidLedger};

/// Infinite stream of raw broker payloads, ended only when the underlying
/// subscription closes.
pub type MessageStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Ledger failure surfaced to the submit path.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store rejected or lost the operation.
    #[error("store error: {0}")]
    Backend(#[from] ::redis::RedisError),

    /// A bid could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broker failure. Always treated as best-effort by callers on the publish
/// path; surfaced only so the listener can distinguish subscribe failures.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The broker connection failed.
    #[error("broker error: {0}")]
    Backend(#[from] ::redis::RedisError),

    /// A bid could not be serialized for publishing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only, TTL-bounded store of bids per booking.
#[async_trait]
pub trait BidLedger: Send + Sync + std::fmt::Debug {
    /// Appends a bid to the booking's list and refreshes the list's TTL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the append itself fails. A failed TTL
    /// refresh is logged and tolerated, not surfaced.
    async fn append(&self, booking_id: &str, bid: &Bid) -> Result<(), StoreError>;

    /// Returns the booking's retained bids in submission order. Empty if the
    /// list never existed or has expired. Entries that no longer deserialize
    /// are dropped, not fatal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read itself fails.
    async fn list(&self, booking_id: &str) -> Result<Vec<Bid>, StoreError>;
}

/// Cross-process publish/subscribe medium keyed by channel name.
#[async_trait]
pub trait BidBroker: Send + Sync + std::fmt::Debug {
    /// Publishes a bid to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on failure; callers on the submit path swallow
    /// and log it.
    async fn publish(&self, channel: &str, bid: &Bid) -> Result<(), BrokerError>;

    /// Subscribes to the channel, returning an infinite stream of raw
    /// payloads that ends only when the subscription closes.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] if the subscription cannot be established.
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError>;
}

/// Initializes the ledger and broker for the configured backend.
///
/// # Errors
///
/// Returns an error for an unknown backend name or an unreachable Redis.
pub async fn init_store(
    config: &GatewayConfig,
) -> Result<(Arc<dyn BidLedger>, Arc<dyn BidBroker>), Box<dyn std::error::Error>> {
    let ttl = Duration::from_secs(config.bid_ttl_secs);

    match config.store_backend.as_str() {
        "redis" => {
            let client = ::redis::Client::open(config.redis_url.as_str())?;
            let conn = ::redis::aio::ConnectionManager::new(client.clone()).await?;
            info!(url = %config.redis_url, "connected to redis");

            let ledger = Arc::new(RedisBidLedger::new(conn.clone(), ttl));
            let broker = Arc::new(RedisBidBroker::new(client, conn));
            Ok((ledger, broker))
        }
        "memory" => {
            info!("using in-process store backend");
            let ledger = Arc::new(MemoryBidLedger::new(ttl));
            let broker = Arc::new(MemoryBidBroker::new(config.broker_channel_capacity));
            Ok((ledger, broker))
        }
        other => Err(format!("unknown store backend: {other}").into()),
    }
}
