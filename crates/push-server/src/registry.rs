//! Live connection registry
//!
//! Set of currently-admitted push channels. DashMap keeps admission,
//! fan-out and removal safe under concurrent access without a global
//! lock.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle to one authenticated, live push channel.
///
/// The id exists for logging and the initial-send tag only; routing
/// never uses it. The sender feeds the per-connection forward task
/// that owns the socket's write side.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl ClientConnection {
    pub fn new(id: Uuid, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, tx }
    }

    /// Queue a frame; `false` means the channel is already closed
    pub fn send(&self, msg: Message) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Registry of live connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, ClientConnection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conn: ClientConnection) {
        self.connections.insert(conn.id, conn);
    }

    pub fn remove(&self, id: &Uuid) -> Option<ClientConnection> {
        self.connections.remove(id).map(|(_, conn)| conn)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Keep only connections the predicate accepts; used by the
    /// fan-out step to drop broken channels as it goes
    pub fn retain(&self, f: impl FnMut(&Uuid, &mut ClientConnection) -> bool) {
        self.connections.retain(f);
    }

    /// Drop every registered sender, which ends each per-connection
    /// forward task and closes its socket
    pub fn clear(&self) {
        self.connections.clear();
    }
}
