//! Background refresh loop
//!
//! One dedicated task for the lifetime of the process, independent of
//! any client activity. Each tick fetches from the upstream source,
//! compares against the stored snapshot and queues changed snapshots
//! for broadcast. Fetch failures are logged and retried on the next
//! tick; nothing terminates the loop except a shutdown signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use fx_core::{PollerConfig, RateSnapshot};

use crate::source::RateSource;
use crate::store::RateStore;

/// Periodic rate refresher
pub struct RatePoller {
    source: Arc<dyn RateSource>,
    store: Arc<RateStore>,
    interval: Duration,
}

impl RatePoller {
    pub fn new(source: Arc<dyn RateSource>, store: Arc<RateStore>, config: &PollerConfig) -> Self {
        Self {
            source,
            store,
            interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// Run until the shutdown signal fires.
    ///
    /// Changed snapshots are pushed into `updates_tx` in the order they
    /// were accepted; the broadcaster drains the channel on the other
    /// side. Fixed-rate cadence: the first tick fires immediately, then
    /// once per interval regardless of fetch outcome.
    pub async fn run(
        self,
        updates_tx: mpsc::Sender<Arc<RateSnapshot>>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        info!("Rate poller started, interval {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(&updates_tx).await,
                _ = &mut shutdown => {
                    info!("Rate poller stopping");
                    break;
                }
            }
        }
    }

    async fn tick(&self, updates_tx: &mpsc::Sender<Arc<RateSnapshot>>) {
        match self.source.fetch().await {
            Ok(snapshot) => {
                if self.store.replace_if_changed(snapshot) {
                    let current = self.store.get();
                    info!("Rates changed, {} currencies queued for broadcast", current.len());

                    if updates_tx.send(current).await.is_err() {
                        // Broadcaster gone; keep the store fresh anyway
                        debug!("Updates channel closed");
                    }
                }
            }
            Err(e) => warn!("Rate fetch failed, retrying next tick: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use fx_core::{CurrencyRate, FetchError, FetchResult};

    /// Source that replays a scripted sequence of results, then errors
    struct ScriptedSource {
        script: Mutex<VecDeque<FetchResult<RateSnapshot>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<FetchResult<RateSnapshot>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl RateSource for ScriptedSource {
        async fn fetch(&self) -> FetchResult<RateSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".into())))
        }
    }

    fn usd(value: &str) -> RateSnapshot {
        [(
            "USD".to_string(),
            CurrencyRate::new("US Dollar", value.parse().unwrap()),
        )]
        .into_iter()
        .collect()
    }

    fn poller(source: Arc<ScriptedSource>, store: Arc<RateStore>) -> RatePoller {
        RatePoller::new(
            source,
            store,
            &PollerConfig {
                poll_interval_secs: 60,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_survives_consecutive_fetch_failures() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(usd("90.00")),
            Err(FetchError::Transport("down".into())),
            Err(FetchError::BadStatus(503)),
            Err(FetchError::MalformedPayload("truncated".into())),
            Ok(usd("90.00")),
        ]));
        let store = Arc::new(RateStore::new());
        let (tx, mut rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(poller(Arc::clone(&source), Arc::clone(&store)).run(tx, shutdown_rx));

        // Five ticks: t=0 plus four intervals
        tokio::time::sleep(Duration::from_secs(250)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(source.calls(), 5, "loop must keep fetching through failures");
        assert_eq!(*store.get(), usd("90.00"), "failures must not touch the store");

        // Only the first successful fetch changed anything
        assert_eq!(*rx.recv().await.unwrap(), usd("90.00"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_detection_end_to_end() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(usd("90.00")),
            Ok(usd("90.00")),
            Ok(usd("91.50")),
        ]));
        let store = Arc::new(RateStore::new());
        let (tx, mut rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        assert!(store.get().is_empty());

        let handle = tokio::spawn(poller(Arc::clone(&source), Arc::clone(&store)).run(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_secs(130)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(source.calls(), 3);
        assert_eq!(*store.get(), usd("91.50"));

        // First fetch and the value change broadcast; the identical
        // second fetch does not
        assert_eq!(*rx.recv().await.unwrap(), usd("90.00"));
        assert_eq!(*rx.recv().await.unwrap(), usd("91.50"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_between_ticks() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(usd("90.00"))]));
        let store = Arc::new(RateStore::new());
        let (tx, _rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(poller(Arc::clone(&source), store).run(tx, shutdown_rx));

        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(source.calls(), 1, "only the immediate first tick ran");
    }
}
