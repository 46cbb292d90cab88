//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::store::{BidBroker, BidLedger};
use crate::ws::{ConnectionRegistry, ListenerSupervisor};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Durable, TTL-bounded bid storage.
    pub ledger: Arc<dyn BidLedger>,
    /// Cross-process fan-out medium.
    pub broker: Arc<dyn BidBroker>,
    /// This process's live viewer connections, grouped by channel.
    pub connections: Arc<ConnectionRegistry>,
    /// Per-channel listener tasks bridging broker to connections.
    pub listeners: Arc<ListenerSupervisor>,
    /// Credential verifier for REST and live-channel access.
    pub verifier: Arc<dyn TokenVerifier>,
}
