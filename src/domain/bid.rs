//! The bid value record.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A driver's price bid on a booking.
///
/// Immutable once created. The serialized JSON form is the wire
/// representation stored in the ledger and published to the broker, so the
/// field names below are part of the compatibility surface shared with
/// every other process on the same store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bid {
    /// Bid identifier.
    pub id: String,
    /// Booking this bid targets.
    pub booking_id: String,
    /// Offered fare.
    pub bid_amount: i64,
    /// Submitting driver's identifier.
    pub driver_id: i64,
    /// Driver display name.
    pub driver_name: String,
    /// Driver rating.
    pub driver_rating: i32,
    /// Driver contact number.
    pub driver_mobile: String,
    /// Vehicle identifier.
    pub car_id: i64,
    /// Vehicle type (e.g. `"sedan"`).
    pub car_type: String,
    /// Vehicle image reference.
    pub car_image: String,
}
