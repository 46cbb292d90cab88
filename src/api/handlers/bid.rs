//! Bid submission and query endpoint handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tracing::warn;

use crate::api::dto::{SubmitBidRequest, SubmitBidResponse};
use crate::api::middleware::require_bearer;
use crate::app_state::AppState;
use crate::domain::{Bid, broker_channel};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /bid/submit` — Accept a driver's bid on a booking.
///
/// The ledger write is the durability guarantee; the broker publish is a
/// best-effort latency optimization and its failure is never surfaced.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed submission or a ledger failure.
#[utoipa::path(
    post,
    path = "/api/v1/bid/submit",
    tag = "Bids",
    summary = "Submit a bid",
    description = "Persists the bid in the booking's TTL-bounded ledger and fans it out to live viewers.",
    request_body = SubmitBidRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bid placed", body = SubmitBidResponse),
        (status = 400, description = "Malformed submission", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 500, description = "Ledger unavailable", body = ErrorResponse),
    )
)]
pub async fn submit_bid(
    State(state): State<AppState>,
    Json(req): Json<SubmitBidRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bid = parse_bid_request(req)?;

    state.ledger.append(&bid.booking_id, &bid).await?;

    let channel = broker_channel(&bid.booking_id);
    if let Err(err) = state.broker.publish(&channel, &bid).await {
        // A missed live update is acceptable; late joiners pull from the
        // ledger.
        warn!(
            booking_id = %bid.booking_id,
            error = %err,
            "bid publish failed; viewers will catch up from the ledger"
        );
    }

    Ok(Json(SubmitBidResponse {
        status: "bid placed".to_string(),
        bid_id: bid.id,
    }))
}

/// `GET /bids/{booking_id}` — Ordered bids retained for a booking.
///
/// # Errors
///
/// Returns [`GatewayError`] if the ledger read fails.
#[utoipa::path(
    get,
    path = "/api/v1/bids/{booking_id}",
    tag = "Bids",
    summary = "List retained bids",
    description = "Returns the booking's retained bids in submission order; empty once the retention window has elapsed.",
    params(
        ("booking_id" = String, Path, description = "Booking identifier"),
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Retained bids in submission order", body = Vec<Bid>),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 500, description = "Ledger unavailable", body = ErrorResponse),
    )
)]
pub async fn list_bids(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let bids = state.ledger.list(&booking_id).await?;
    Ok(Json(bids))
}

/// Bid routes, bearer-protected.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bid/submit", post(submit_bid))
        .route("/bids/{booking_id}", get(list_bids))
        .route_layer(middleware::from_fn_with_state(state, require_bearer))
}

/// Validates a submission and completes it into a [`Bid`].
fn parse_bid_request(req: SubmitBidRequest) -> Result<Bid, GatewayError> {
    if req.booking_id.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "booking_id must not be empty".to_string(),
        ));
    }
    if req.bid_amount <= 0 {
        return Err(GatewayError::InvalidRequest(
            "bid_amount must be positive".to_string(),
        ));
    }

    let id = if req.id.trim().is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        req.id
    };

    Ok(Bid {
        id,
        booking_id: req.booking_id,
        bid_amount: req.bid_amount,
        driver_id: req.driver_id,
        driver_name: req.driver_name,
        driver_rating: req.driver_rating,
        driver_mobile: req.driver_mobile,
        car_id: req.car_id,
        car_type: req.car_type,
        car_image: req.car_image,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::auth::JwtVerifier;
    use crate::store::{MemoryBidBroker, MemoryBidLedger};
    use crate::ws::{ConnectionRegistry, ListenerSupervisor};

    fn test_state() -> AppState {
        let ledger = Arc::new(MemoryBidLedger::new(Duration::from_secs(900)));
        let broker = Arc::new(MemoryBidBroker::new(64));
        let connections = Arc::new(ConnectionRegistry::new());
        let listeners = Arc::new(ListenerSupervisor::new(
            Arc::clone(&broker) as _,
            Arc::clone(&connections),
        ));
        AppState {
            ledger,
            broker,
            connections,
            listeners,
            verifier: Arc::new(JwtVerifier::new("test-secret")),
        }
    }

    fn make_request(id: &str, booking_id: &str, amount: i64) -> SubmitBidRequest {
        SubmitBidRequest {
            id: id.to_string(),
            booking_id: booking_id.to_string(),
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

    #[tokio::test]
    async fn submitted_bids_are_listed_in_order() {
        let state = test_state();
        for (id, amount) in [("b1", 500), ("b2", 450)] {
            let result = submit_bid(
                State(state.clone()),
                Json(make_request(id, "BK1", amount)),
            )
            .await;
            assert!(result.is_ok());
        }

        let Ok(bids) = state.ledger.list("BK1").await else {
            panic!("list failed");
        };
        let ids: Vec<&str> = bids.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["b1", "b2"]);
    }

    #[tokio::test]
    async fn empty_booking_id_is_rejected() {
        let state = test_state();
        let result = submit_bid(State(state), Json(make_request("b1", "  ", 500))).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let state = test_state();
        let result = submit_bid(State(state), Json(make_request("b1", "BK1", 0))).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn missing_id_gets_assigned_one() {
        let state = test_state();
        let result = submit_bid(State(state.clone()), Json(make_request("", "BK1", 500))).await;
        assert!(result.is_ok());

        let Ok(bids) = state.ledger.list("BK1").await else {
            panic!("list failed");
        };
        assert_eq!(bids.len(), 1);
        assert!(
            bids.first().is_some_and(|b| !b.id.is_empty()),
            "gateway must assign an id"
        );
    }

    #[tokio::test]
    async fn broker_failure_does_not_fail_acceptance() {
        // The memory broker cannot fail, so this exercises the no-subscriber
        // path: publish goes nowhere and submission still succeeds.
        let state = test_state();
        let result = submit_bid(State(state.clone()), Json(make_request("b1", "BK1", 500))).await;
        assert!(result.is_ok());
        let Ok(bids) = state.ledger.list("BK1").await else {
            panic!("list failed");
        };
        assert_eq!(bids.len(), 1);
    }
}
