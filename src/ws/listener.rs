//! Per-channel listener tasks bridging the broker into local broadcasts.
//!
//! [`ListenerSupervisor`] guarantees at most one listener task per channel
//! per process. The check-and-mark and the task spawn happen under one
//! coarse lock, so two viewers racing to be first on a channel can never
//! start two listeners. Listener-start is rare relative to message volume,
//! which makes the single lock acceptable.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{Mutex, oneshot};
use tracing::{info, warn};

use super::registry::ConnectionRegistry;
use crate::domain::{Bid, broker_channel};
use crate::store::BidBroker;

/// Lifecycle of one channel's listener within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Task spawned, broker subscription not yet established.
    Starting,
    /// Subscribed and forwarding messages.
    Active,
    /// The broker subscription ended; terminal.
    Stopped,
}

/// Ensures exactly one broker subscription task per channel per process.
#[derive(Debug)]
pub struct ListenerSupervisor {
    broker: Arc<dyn BidBroker>,
    connections: Arc<ConnectionRegistry>,
    active: Arc<Mutex<HashMap<String, ListenerState>>>,
}

impl ListenerSupervisor {
    /// Creates a supervisor over the given broker and connection registry.
    #[must_use]
    pub fn new(broker: Arc<dyn BidBroker>, connections: Arc<ConnectionRegistry>) -> Self {
        Self {
            broker,
            connections,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts the booking channel's listener if this process does not have
    /// one yet.
    ///
    /// When this call is the one that starts the listener, it returns only
    /// after the broker subscription is established, so a publish issued
    /// right after connecting cannot slip past it. Callers that find the
    /// listener already present return immediately; once started, a
    /// listener covers every later registration on the channel.
    pub async fn ensure_listener(&self, booking_id: &str) {
        let channel = broker_channel(booking_id);
        let (ready_tx, ready_rx) = oneshot::channel();
        {
            let mut active = self.active.lock().await;
            if active.contains_key(&channel) {
                return;
            }
            active.insert(channel.clone(), ListenerState::Starting);
            tokio::spawn(run_listener(
                Arc::clone(&self.broker),
                Arc::clone(&self.connections),
                Arc::clone(&self.active),
                channel,
                ready_tx,
            ));
        }
        // Outside the lock: wait for the subscription outcome. A dropped
        // sender (subscribe failure) resolves this too.
        let _ = ready_rx.await;
    }

    /// Current listener state for the booking's channel, if any.
    pub async fn state(&self, booking_id: &str) -> Option<ListenerState> {
        let active = self.active.lock().await;
        active.get(&broker_channel(booking_id)).copied()
    }
}

/// Subscribes and forwards broker messages into registry broadcasts until
/// the subscription ends. Viewer disconnects never stop it; the listener
/// lives for the rest of the process once started.
async fn run_listener(
    broker: Arc<dyn BidBroker>,
    connections: Arc<ConnectionRegistry>,
    active: Arc<Mutex<HashMap<String, ListenerState>>>,
    channel: String,
    ready_tx: oneshot::Sender<()>,
) {
    let mut stream = match broker.subscribe(&channel).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%channel, error = %err, "broker subscribe failed; live fan-out unavailable");
            // Clear the mark so the next viewer on this channel can retry.
            active.lock().await.remove(&channel);
            return;
        }
    };

    active
        .lock()
        .await
        .insert(channel.clone(), ListenerState::Active);
    let _ = ready_tx.send(());
    info!(%channel, "bid channel listener started");

    while let Some(payload) = stream.next().await {
        // A single malformed message must not kill fan-out for the rest of
        // the channel's lifetime.
        let bid = match serde_json::from_slice::<Bid>(&payload) {
            Ok(bid) => bid,
            Err(err) => {
                warn!(%channel, error = %err, "skipping malformed broker message");
                continue;
            }
        };
        match serde_json::to_string(&bid) {
            Ok(frame) => {
                connections.broadcast(&channel, &frame).await;
            }
            Err(err) => warn!(%channel, error = %err, "failed to re-serialize bid"),
        }
    }

    active
        .lock()
        .await
        .insert(channel.clone(), ListenerState::Stopped);
    warn!(%channel, "broker subscription ended; listener stopped");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;
    use crate::store::{BidLedger, MemoryBidBroker, MemoryBidLedger};

    const BOOKING: &str = "BK1";

    fn make_bid(id: &str, amount: i64) -> Bid {
        Bid {
            id: id.to_string(),
            booking_id: BOOKING.to_string(),
            bid_amount: amount,
            driver_id: 7,
            driver_name: "Rahim".to_string(),
            driver_rating: 5,
            driver_mobile: "+8801700000000".to_string(),
            car_id: 12,
            car_type: "sedan".to_string(),
            car_image: "cars/12.png".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryBidBroker>, Arc<ConnectionRegistry>, ListenerSupervisor) {
        let broker = Arc::new(MemoryBidBroker::new(64));
        let connections = Arc::new(ConnectionRegistry::new());
        let supervisor = ListenerSupervisor::new(
            Arc::clone(&broker) as Arc<dyn BidBroker>,
            Arc::clone(&connections),
        );
        (broker, connections, supervisor)
    }

    async fn recv_bid(rx: &mut mpsc::UnboundedReceiver<String>) -> Bid {
        let Ok(Some(frame)) = timeout(Duration::from_secs(1), rx.recv()).await else {
            panic!("expected a delivered frame");
        };
        let Ok(bid) = serde_json::from_str::<Bid>(&frame) else {
            panic!("frame must deserialize as a bid");
        };
        bid
    }

    #[tokio::test]
    async fn every_viewer_gets_exactly_one_copy() {
        let (broker, connections, supervisor) = setup();
        let channel = broker_channel(BOOKING);

        let mut receivers = Vec::new();
        for _ in 0..4 {
            let (tx, rx) = mpsc::unbounded_channel();
            connections.register(&channel, tx).await;
            receivers.push(rx);
        }
        supervisor.ensure_listener(BOOKING).await;

        let bid = make_bid("b1", 500);
        let Ok(()) = broker.publish(&channel, &bid).await else {
            panic!("publish failed");
        };

        for rx in &mut receivers {
            assert_eq!(recv_bid(rx).await, bid);
            // No duplicate copy follows.
            let extra = timeout(Duration::from_millis(50), rx.recv()).await;
            assert!(extra.is_err(), "viewer must receive exactly one copy");
        }
    }

    #[tokio::test]
    async fn first_publish_race_is_covered_once_ensure_returns() {
        let (broker, connections, supervisor) = setup();
        let channel = broker_channel(BOOKING);

        // Viewers register concurrently with the first-ever listener start.
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            connections.register(&channel, tx).await;
            receivers.push(rx);
        }
        let supervisor = Arc::new(supervisor);
        let mut ensures = tokio::task::JoinSet::new();
        for _ in 0..3 {
            let racing = Arc::clone(&supervisor);
            ensures.spawn(async move { racing.ensure_listener(BOOKING).await });
        }
        while ensures.join_next().await.is_some() {}

        // Exactly one subscription exists despite the racing ensures.
        assert_eq!(supervisor.state(BOOKING).await, Some(ListenerState::Active));
        assert_eq!(broker.subscriber_count(&channel).await, 1);

        let bid = make_bid("b1", 500);
        let Ok(()) = broker.publish(&channel, &bid).await else {
            panic!("publish failed");
        };
        for rx in &mut receivers {
            assert_eq!(recv_bid(rx).await, bid);
        }
    }

    #[tokio::test]
    async fn malformed_message_does_not_stop_the_channel() {
        let (broker, connections, supervisor) = setup();
        let channel = broker_channel(BOOKING);

        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.register(&channel, tx).await;
        supervisor.ensure_listener(BOOKING).await;

        broker.publish_raw(&channel, b"not a bid".to_vec()).await;
        let bid = make_bid("b2", 450);
        let Ok(()) = broker.publish(&channel, &bid).await else {
            panic!("publish failed");
        };

        // The well-formed message still arrives, and nothing came before it.
        assert_eq!(recv_bid(&mut rx).await, bid);
    }

    #[tokio::test]
    async fn listener_outlives_viewer_churn() {
        let (broker, connections, supervisor) = setup();
        let channel = broker_channel(BOOKING);

        let (tx, rx) = mpsc::unbounded_channel();
        let id = connections.register(&channel, tx).await;
        supervisor.ensure_listener(BOOKING).await;

        drop(rx);
        connections.unregister(&channel, id).await;
        assert_eq!(supervisor.state(BOOKING).await, Some(ListenerState::Active));

        // A viewer joining later is covered without a second ensure racing.
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        connections.register(&channel, tx2).await;
        supervisor.ensure_listener(BOOKING).await;

        let bid = make_bid("b3", 470);
        let Ok(()) = broker.publish(&channel, &bid).await else {
            panic!("publish failed");
        };
        assert_eq!(recv_bid(&mut rx2).await, bid);
    }

    #[tokio::test]
    async fn late_joiner_sees_history_via_ledger_and_live_tail_only() {
        let (broker, connections, supervisor) = setup();
        let channel = broker_channel(BOOKING);
        let ledger = MemoryBidLedger::new(Duration::from_secs(900));

        // b1 submitted with no viewers: ledger write succeeds, publish is
        // a no-op best effort.
        let b1 = make_bid("b1", 500);
        let Ok(()) = ledger.append(BOOKING, &b1).await else {
            panic!("append failed");
        };
        let Ok(()) = broker.publish(&channel, &b1).await else {
            panic!("publish failed");
        };

        // Viewer connects afterwards.
        let (tx, mut rx) = mpsc::unbounded_channel();
        connections.register(&channel, tx).await;
        supervisor.ensure_listener(BOOKING).await;

        // b2 arrives: persisted and fanned out.
        let b2 = make_bid("b2", 450);
        let Ok(()) = ledger.append(BOOKING, &b2).await else {
            panic!("append failed");
        };
        let Ok(()) = broker.publish(&channel, &b2).await else {
            panic!("publish failed");
        };

        // Live delivery covers b2 only; the pull returns both in order.
        assert_eq!(recv_bid(&mut rx).await, b2);
        let extra = timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(extra.is_err(), "b1 must not be replayed live");

        let Ok(bids) = ledger.list(BOOKING).await else {
            panic!("list failed");
        };
        let ids: Vec<&str> = bids.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2"]);
    }
}
