//! Process liveness heartbeat.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::store::{best_effort, keys, Command, CoordinationStore};

/// Writes the current time to `hchecker_ping`.
#[derive(Clone)]
pub struct Heartbeat {
    store: Arc<dyn CoordinationStore>,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(store: Arc<dyn CoordinationStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Record liveness once. Failures are logged, never returned.
    pub async fn ping_alive(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        best_effort(
            "heartbeat",
            self.store
                .execute(Command::Set {
                    key: keys::HEARTBEAT_KEY.to_string(),
                    value: now.to_string(),
                })
                .await,
        );
        metrics::record_heartbeat();
    }

    /// Ping on every tick until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Heartbeat starting");

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.ping_alive().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_ping_writes_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let heartbeat = Heartbeat::new(store.clone(), Duration::from_secs(10));

        heartbeat.ping_alive().await;

        let value: u64 = store.string_value(keys::HEARTBEAT_KEY).unwrap().parse().unwrap();
        assert!(value > 1_600_000_000);
    }

    #[tokio::test]
    async fn test_ping_tolerates_outage() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        Heartbeat::new(store.clone(), Duration::from_secs(10)).ping_alive().await;
        store.set_offline(false);
        assert_eq!(store.string_value(keys::HEARTBEAT_KEY), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(Heartbeat::new(store.clone(), Duration::from_secs(10)).run(rx));

        time::sleep(Duration::from_secs(25)).await;
        assert!(store.string_value(keys::HEARTBEAT_KEY).is_some());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
