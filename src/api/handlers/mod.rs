//! REST endpoint handlers organized by resource.

pub mod bid;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new().merge(bid::routes(state))
}
