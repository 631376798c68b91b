//! Chat Server Library
//!
//! Direct-message chat over SQLite with real-time fan-out through a
//! Centrifugo-compatible broker.

pub mod chat;
pub mod connections;
pub mod core;
pub mod handlers;
pub mod models;
pub mod presence;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use realtime::CentrifugoClient;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use crate::chat::ChatService;
pub use crate::connections::ConnectionManager;
pub use crate::core::{router, AppState, ChatError, ChatServerConfig, Ctx};
pub use crate::presence::PresenceService;
pub use crate::store::ChatStore;

/// Interval between sweeps that expire stale connection requests.
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    info!("=== Chat Server ===");

    let config = ChatServerConfig::from_env()?;

    let store = ChatStore::connect(&config.database_url).await?;
    info!("Database: {}", config.database_url);

    let publisher = Arc::new(
        CentrifugoClient::new(config.broker.clone()).context("Failed to build broker client")?,
    );
    info!("[Realtime] Broker at {}", publisher.config().url);

    let state = AppState::new(config.clone(), store.clone(), publisher);

    // Pending connection requests lapse in the background.
    let connections = state.connections.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = connections.expire_old_requests().await {
                warn!("[Connections] Expiry sweep failed: {}", e);
            }
        }
    });

    let presence = state.presence.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Chat server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    presence.shutdown();
    store.close().await;
    info!("Chat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
