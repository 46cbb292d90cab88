//! WebSocket layer: live bid channels.
//!
//! One channel per booking. Every process keeps at most one broker
//! subscription per channel (the listener) and a registry of the local
//! viewer connections it fans out to.

pub mod connection;
pub mod handler;
pub mod listener;
pub mod registry;

pub use listener::{ListenerState, ListenerSupervisor};
pub use registry::{ConnectionId, ConnectionRegistry};
