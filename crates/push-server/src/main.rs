//! FX rates push server
//!
//! Main entry point: wires the rate-refresh subsystem to the
//! WebSocket fan-out and runs until a shutdown signal.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fx_push_server::{
    AppState, Broadcaster, ConnectionGate, ConnectionRegistry, PushServer, SessionCookieAuth,
};
use fx_push_server::settings;
use fx_rate_feed::{CbrRateSource, RatePoller, RateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting FX rates push server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = settings::load()?;

    // Shared state
    let store = Arc::new(RateStore::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry), Arc::clone(&store)));
    let auth = Arc::new(SessionCookieAuth::new(&config.auth));
    let gate = Arc::new(ConnectionGate::new(
        auth,
        Arc::clone(&registry),
        Arc::clone(&broadcaster),
    ));

    // Background refresh: poller pushes accepted changes into the
    // updates channel, broadcaster fans them out
    let source = Arc::new(CbrRateSource::new(&config.upstream)?);
    let poller = RatePoller::new(source, Arc::clone(&store), &config.poller);

    let (updates_tx, updates_rx) = mpsc::channel(64);
    let (poller_shutdown_tx, poller_shutdown_rx) = oneshot::channel();

    let poller_handle = tokio::spawn(poller.run(updates_tx, poller_shutdown_rx));
    let broadcast_handle = tokio::spawn(Arc::clone(&broadcaster).run(updates_rx));
    info!("Background services started");

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    // Start server
    let server = PushServer::new(config.server.clone(), AppState { gate });
    info!("Push server listening on {}", server.address());
    info!("Press Ctrl+C to shutdown");

    if let Err(e) = server.start_with_shutdown(shutdown_rx).await {
        error!("Server error: {e}");
        return Err(e);
    }

    // Stop the poller between ticks, then close live connections
    let _ = poller_shutdown_tx.send(());
    let _ = poller_handle.await;
    broadcaster.close_all();
    let _ = broadcast_handle.await;

    info!("Server shutdown complete");
    Ok(())
}
