//! Bid submission request and confirmation response.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Bid submission payload.
///
/// Field names match the bid wire format; `id` may be omitted, in which
/// case the gateway assigns one.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitBidRequest {
    /// Bid identifier; server-assigned when empty or missing.
    #[serde(default)]
    pub id: String,
    /// Booking this bid targets.
    pub booking_id: String,
    /// Offered fare; must be positive.
    pub bid_amount: i64,
    /// Submitting driver's identifier.
    pub driver_id: i64,
    /// Driver display name.
    #[serde(default)]
    pub driver_name: String,
    /// Driver rating.
    #[serde(default)]
    pub driver_rating: i32,
    /// Driver contact number.
    #[serde(default)]
    pub driver_mobile: String,
    /// Vehicle identifier.
    #[serde(default)]
    pub car_id: i64,
    /// Vehicle type.
    #[serde(default)]
    pub car_type: String,
    /// Vehicle image reference.
    #[serde(default)]
    pub car_image: String,
}

/// Confirmation returned for an accepted bid.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitBidResponse {
    /// Human-readable acceptance status.
    pub status: String,
    /// Identifier of the stored bid.
    pub bid_id: String,
}
