//! Axum WebSocket upgrade handler for the live bid channel.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::GatewayError;

/// Query parameters for the live bid channel.
#[derive(Debug, Deserialize)]
pub struct LiveBidsQuery {
    /// Opaque credential; verified before the upgrade.
    pub token: Option<String>,
}

/// `GET /api/v1/ws/bids/{booking_id}` — live bid stream for one booking.
///
/// The credential is checked before the protocol upgrade; a missing or bad
/// token is refused with 401 and no connection state is created.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] on a missing or invalid token.
pub async fn live_bids_handler(
    ws: WebSocketUpgrade,
    Path(booking_id): Path<String>,
    Query(query): Query<LiveBidsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let token = query
        .token
        .ok_or_else(|| GatewayError::Unauthorized("missing token".to_string()))?;
    state.verifier.verify(&token)?;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, booking_id, state)))
}
