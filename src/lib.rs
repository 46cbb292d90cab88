//! # ridebid-gateway
//!
//! REST API and WebSocket gateway for a ride-booking marketplace's
//! real-time bid pipeline. Drivers submit price bids for a booking;
//! passengers watching that booking receive every bid within milliseconds,
//! whichever server process they happen to be connected to.
//!
//! ## Architecture
//!
//! ```text
//! Drivers (HTTP)                         Passengers (WebSocket)
//!     │                                       │
//!     ├── REST Handlers (api/)               ├── WS Handler (ws/)
//!     │                                       │
//!     ├── BidLedger ──────── Redis list      ├── ConnectionRegistry (ws/)
//!     │   (store/)           bids:<id>       │
//!     │                                       │
//!     └── BidBroker ──────── Redis pub/sub ──┴── ListenerSupervisor (ws/)
//!         (store/)           bids_channel:<id>
//! ```
//!
//! A submitted bid is first appended to the booking's TTL-bounded ledger
//! list (the durability guarantee), then published to the booking's broker
//! channel (best-effort latency optimization). Every process with at least
//! one live viewer of the booking runs exactly one listener task that
//! bridges broker messages into local connection broadcasts.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod store;
pub mod ws;
