//! Connection admission control
//!
//! New push-channel attempts are checked against the session
//! authentication boundary before the WebSocket upgrade happens.
//! Unauthenticated attempts are declined outright: no upgrade, no
//! registry entry, no event.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use fx_core::{AdmissionError, AdmissionResult, AuthConfig};

use crate::broadcast::Broadcaster;
use crate::registry::{ClientConnection, ConnectionRegistry};

/// Request-side context a connection attempt arrives with
#[derive(Debug, Default)]
pub struct SessionContext {
    cookies: HashMap<String, String>,
}

impl SessionContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();

        for value in headers.get_all(COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    cookies.insert(name.to_string(), value.to_string());
                }
            }
        }

        Self { cookies }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Authentication boundary.
///
/// Backed by whatever session subsystem issued the cookie; this crate
/// treats the verdict as opaque.
pub trait SessionAuth: Send + Sync {
    fn is_authenticated(&self, ctx: &SessionContext) -> bool;
}

/// Session-cookie presence check.
///
/// The login subsystem that issues and validates the cookie lives
/// outside this repository; a non-empty cookie under the configured
/// name is what it hands authenticated sessions.
pub struct SessionCookieAuth {
    cookie_name: String,
}

impl SessionCookieAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            cookie_name: config.session_cookie.clone(),
        }
    }
}

impl SessionAuth for SessionCookieAuth {
    fn is_authenticated(&self, ctx: &SessionContext) -> bool {
        ctx.cookie(&self.cookie_name)
            .is_some_and(|value| !value.is_empty())
    }
}

/// Admission control for new push-channel connections.
///
/// `authorize` runs before the upgrade; `admit` completes admission
/// once the socket exists: fresh id, registry entry, immediate initial
/// snapshot.
pub struct ConnectionGate {
    auth: Arc<dyn SessionAuth>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
}

impl ConnectionGate {
    pub fn new(
        auth: Arc<dyn SessionAuth>,
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            auth,
            registry,
            broadcaster,
        }
    }

    /// Reject before the channel is established; nothing is allocated
    /// for a rejected attempt
    pub fn authorize(&self, ctx: &SessionContext) -> AdmissionResult<()> {
        if self.auth.is_authenticated(ctx) {
            Ok(())
        } else {
            debug!("Rejected unauthenticated connection attempt");
            Err(AdmissionError::Unauthenticated)
        }
    }

    /// Register an upgraded connection and deliver its initial snapshot
    pub fn admit(&self, tx: mpsc::UnboundedSender<Message>) -> ClientConnection {
        let conn = ClientConnection::new(Uuid::new_v4(), tx);
        info!("Client connected with id {}", conn.id);

        self.registry.insert(conn.clone());
        self.broadcaster.send_initial(&conn);

        conn
    }

    /// Remove a connection whose socket closed
    pub fn disconnect(&self, id: &Uuid) {
        if self.registry.remove(id).is_some() {
            info!("Client {id} disconnected");
        }
    }
}
