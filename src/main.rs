//! ridebid-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ridebid_gateway::api;
use ridebid_gateway::app_state::AppState;
use ridebid_gateway::auth::JwtVerifier;
use ridebid_gateway::config::GatewayConfig;
use ridebid_gateway::store;
use ridebid_gateway::ws::handler::live_bids_handler;
use ridebid_gateway::ws::{ConnectionRegistry, ListenerSupervisor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting ridebid-gateway");

    // Ledger + broker backends
    let (ledger, broker) = store::init_store(&config).await?;

    // Fan-out layer
    let connections = Arc::new(ConnectionRegistry::new());
    let listeners = Arc::new(ListenerSupervisor::new(
        Arc::clone(&broker),
        Arc::clone(&connections),
    ));

    // Build application state
    let app_state = AppState {
        ledger,
        broker,
        connections,
        listeners,
        verifier: Arc::new(JwtVerifier::new(&config.token_secret)),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router(app_state.clone()))
        .route("/api/v1/ws/bids/{booking_id}", get(live_bids_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
