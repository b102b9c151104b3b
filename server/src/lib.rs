//! Presence relay server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod relay;
pub mod ws;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower_http::cors::CorsLayer;

use config::ServerConfig;
use relay::{run_relay, RelayBroadcast, RelayCommand};
use ws::{ws_handler, AppState};

/// Spawn the relay task and build the router that feeds it.
pub fn build_app(config: &ServerConfig) -> Router {
    let (relay_tx, relay_rx) = mpsc::channel::<RelayCommand>(config.command_capacity);
    let (broadcast_tx, _) = broadcast::channel::<RelayBroadcast>(config.broadcast_capacity);

    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_relay(relay_rx, bc_tx).await;
    });

    let app_state = AppState {
        relay_tx,
        broadcast_tx,
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
        max_frame_bytes: config.max_frame_bytes,
    };
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
