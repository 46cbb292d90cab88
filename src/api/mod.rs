//! REST API layer: route handlers, DTOs, middleware, and router composition.
//!
//! All bid endpoints are mounted under `/api/v1` and bearer-protected;
//! system endpoints live at the root.

pub mod dto;
pub mod handlers;
pub mod middleware;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes(state))
        .merge(handlers::system::routes())
}
