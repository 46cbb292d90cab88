//! Deterministic ledger-key and broker-topic naming for booking channels.
//!
//! Both formats are shared with every other process using the same store and
//! broker. Changing either breaks interoperability.

/// Ledger list key for a booking's retained bids.
#[must_use]
pub fn ledger_key(booking_id: &str) -> String {
    format!("bids:{booking_id}")
}

/// Broker topic for a booking's live bid fan-out.
#[must_use]
pub fn broker_channel(booking_id: &str) -> String {
    format!("bids_channel:{booking_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats_match_the_shared_store() {
        assert_eq!(ledger_key("BK1"), "bids:BK1");
        assert_eq!(broker_channel("BK1"), "bids_channel:BK1");
    }

    #[test]
    fn distinct_bookings_get_distinct_channels() {
        assert_ne!(broker_channel("BK1"), broker_channel("BK2"));
        assert_ne!(ledger_key("BK1"), broker_channel("BK1"));
    }
}
