//! Process-wide snapshot store
//!
//! Holds the single most-recently-accepted snapshot behind a
//! read-write lock. Readers clone an `Arc` and never block on I/O;
//! the compare and the swap on update happen under one write lock so
//! no reader can observe a half-updated snapshot.

use parking_lot::RwLock;
use std::sync::Arc;

use fx_core::RateSnapshot;

/// Shared current-rates state
#[derive(Debug)]
pub struct RateStore {
    current: RwLock<Arc<RateSnapshot>>,
}

impl RateStore {
    /// Starts with the empty sentinel snapshot
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RateSnapshot::empty())),
        }
    }

    /// Current snapshot; empty before the first successful fetch
    pub fn get(&self) -> Arc<RateSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the stored snapshot if the new one differs structurally.
    ///
    /// Returns `true` when a replacement happened. On `false` the old
    /// snapshot stays in place untouched.
    pub fn replace_if_changed(&self, new: RateSnapshot) -> bool {
        let mut current = self.current.write();
        if **current == new {
            return false;
        }
        *current = Arc::new(new);
        true
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}
