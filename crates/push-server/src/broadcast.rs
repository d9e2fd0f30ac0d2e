//! Snapshot fan-out
//!
//! Delivery is best-effort, at-most-once per change per connected
//! client: a broken channel is dropped from the registry, never
//! retried, and never blocks delivery to the others.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use fx_core::RateSnapshot;
use fx_rate_feed::RateStore;

use crate::protocol::ServerEvent;
use crate::registry::{ClientConnection, ConnectionRegistry};

/// Fan-out of rate snapshots to every registered connection
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    store: Arc<RateStore>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<RateStore>) -> Self {
        Self { registry, store }
    }

    /// Send `snapshot` to every registered connection.
    ///
    /// Connections whose channel is already closed are removed in the
    /// same pass; delivery to the remaining connections is unaffected.
    pub fn broadcast_all(&self, snapshot: &RateSnapshot) {
        let msg = match ServerEvent::update(snapshot).to_message() {
            Ok(msg) => msg,
            Err(e) => {
                error!("Failed to serialize rate snapshot: {e}");
                return;
            }
        };

        let before = self.registry.len();
        self.registry.retain(|id, conn| {
            let alive = conn.send(msg.clone());
            if !alive {
                warn!("Dropping client {id}: channel closed");
            }
            alive
        });

        debug!(
            "Broadcast {} rates to {} clients ({} dropped)",
            snapshot.len(),
            self.registry.len(),
            before - self.registry.len()
        );
    }

    /// Unicast the current store snapshot to a newly admitted
    /// connection, tagged with its own id
    pub fn send_initial(&self, conn: &ClientConnection) {
        let snapshot = self.store.get();
        let msg = match ServerEvent::initial(&snapshot, conn.id).to_message() {
            Ok(msg) => msg,
            Err(e) => {
                error!("Failed to serialize initial snapshot: {e}");
                return;
            }
        };

        if !conn.send(msg) {
            warn!("Initial send to client {} failed, removing", conn.id);
            self.registry.remove(&conn.id);
        }
    }

    /// Drain the poller's updates channel for the life of the process.
    ///
    /// The single producer keeps broadcasts in the order the updates
    /// were accepted by the store.
    pub async fn run(self: Arc<Self>, mut updates_rx: mpsc::Receiver<Arc<RateSnapshot>>) {
        while let Some(snapshot) = updates_rx.recv().await {
            self.broadcast_all(&snapshot);
        }
        debug!("Updates channel closed, broadcaster exiting");
    }

    /// Shutdown hook: close every live connection
    pub fn close_all(&self) {
        let n = self.registry.len();
        self.registry.clear();
        if n > 0 {
            info!("Closed {n} client connections");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use uuid::Uuid;

    use fx_core::CurrencyRate;

    fn snapshot(value: &str) -> RateSnapshot {
        [(
            "USD".to_string(),
            CurrencyRate::new("US Dollar", value.parse().unwrap()),
        )]
        .into_iter()
        .collect()
    }

    fn setup() -> (Arc<ConnectionRegistry>, Arc<RateStore>, Broadcaster) {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(RateStore::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), Arc::clone(&store));
        (registry, store, broadcaster)
    }

    fn register(
        registry: &ConnectionRegistry,
    ) -> (Uuid, tokio::sync::mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let conn = ClientConnection::new(Uuid::new_v4(), tx);
        let id = conn.id;
        registry.insert(conn);
        (id, rx)
    }

    #[tokio::test]
    async fn test_fanout_isolates_broken_connection() {
        let (registry, _store, broadcaster) = setup();

        let (_id_a, mut rx_a) = register(&registry);
        let (id_broken, rx_broken) = register(&registry);
        let (_id_c, mut rx_c) = register(&registry);
        drop(rx_broken); // permanently broken channel

        broadcaster.broadcast_all(&snapshot("90.00"));

        // Healthy connections each got exactly one frame
        for rx in [&mut rx_a, &mut rx_c] {
            assert!(rx.try_recv().is_ok());
            assert!(rx.try_recv().is_err());
        }

        // The broken one is gone from the registry
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&id_broken));
    }

    #[tokio::test]
    async fn test_initial_send_carries_store_snapshot_and_id() {
        let (registry, store, broadcaster) = setup();
        store.replace_if_changed(snapshot("90.00"));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let conn = ClientConnection::new(Uuid::new_v4(), tx);
        registry.insert(conn.clone());

        broadcaster.send_initial(&conn);

        let Message::Text(text) = rx.try_recv().unwrap() else {
            panic!("expected text frame");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["event"], "currency_update");
        assert_eq!(json["client_id"], conn.id.to_string());
        assert_eq!(json["rates"]["USD"]["Value"], "90.00");

        // Exactly one event
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_preserves_update_order() {
        let (registry, _store, broadcaster) = setup();
        let (_id, mut rx) = register(&registry);

        let (tx, updates_rx) = mpsc::channel(8);
        let handle = tokio::spawn(Arc::new(broadcaster).run(updates_rx));

        tx.send(Arc::new(snapshot("90.00"))).await.unwrap();
        tx.send(Arc::new(snapshot("91.50"))).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        for (msg, value) in [(first, "90.00"), (second, "91.50")] {
            let Message::Text(text) = msg else {
                panic!("expected text frame");
            };
            let json: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(json["rates"]["USD"]["Value"], value);
        }
    }

    #[tokio::test]
    async fn test_close_all_empties_registry() {
        let (registry, _store, broadcaster) = setup();
        let (_id, mut rx) = register(&registry);

        broadcaster.close_all();
        assert!(registry.is_empty());

        // Sender dropped: the forward task's receiver ends
        assert!(rx.recv().await.is_none());
    }
}
