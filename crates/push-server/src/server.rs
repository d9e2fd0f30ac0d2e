//! Server configuration and startup

use std::net::SocketAddr;

use axum::Router;
use tracing::info;

use fx_core::ServerConfig;

use crate::routes::{create_router, AppState};

/// HTTP/WebSocket server wrapper
pub struct PushServer {
    config: ServerConfig,
    router: Router,
}

impl PushServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            router: create_router(state),
        }
    }

    /// Serve until the shutdown signal fires, then finish in-flight
    /// requests and return
    pub async fn start_with_shutdown(
        self,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Server listening on {addr} (with graceful shutdown)");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                shutdown.await.ok();
                info!("Shutdown signal received");
            })
            .await?;

        Ok(())
    }

    /// Get server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}
