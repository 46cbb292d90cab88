//! Domain layer: the bid record and booking-channel naming.
//!
//! A *booking channel* is the logical topic shared by every process that
//! serves viewers of one booking. It is derived from the booking identifier,
//! never stored.

pub mod bid;
pub mod channel;

pub use bid::Bid;
pub use channel::{broker_channel, ledger_key};
