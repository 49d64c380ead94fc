//! Facade tying the store, lock manager, tracker and reporter together
//! for one process identity.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::CheckerConfig;
use crate::events::EvictionListener;
use crate::health::{Check, Heartbeat, StateReporter};
use crate::locking::{LockManager, LockOutcome, ProcessId};
use crate::mapping::MappingTracker;
use crate::resilience::ReconnectPolicy;
use crate::store::{keys, Command, CoordinationStore, StoreResult};

/// Everything one checker process needs to coordinate with its peers.
#[derive(Clone)]
pub struct HealthCoordinator {
    store: Arc<dyn CoordinationStore>,
    tracker: Arc<MappingTracker>,
    locks: LockManager,
    reporter: StateReporter,
    heartbeat: Heartbeat,
    config: CheckerConfig,
}

impl HealthCoordinator {
    /// Wire the components without touching the store.
    pub fn new(store: Arc<dyn CoordinationStore>, identity: ProcessId, config: CheckerConfig) -> Self {
        let tracker = Arc::new(MappingTracker::new());
        let locks = LockManager::new(store.clone(), identity, tracker.clone());
        let reporter = StateReporter::new(
            store.clone(),
            locks.clone(),
            tracker.clone(),
            Duration::from_secs(config.state.dead_ttl_secs),
        );
        let heartbeat = Heartbeat::new(store.clone(), Duration::from_secs(config.heartbeat.interval_secs));

        Self {
            store,
            tracker,
            locks,
            reporter,
            heartbeat,
            config,
        }
    }

    /// Wire the components and, when configured, clear the lock hash.
    ///
    /// Clearing assumes this process is the only checker on the store: a
    /// second instance restarting would wipe everyone's locks.
    pub async fn start(
        store: Arc<dyn CoordinationStore>,
        identity: ProcessId,
        config: CheckerConfig,
    ) -> StoreResult<Self> {
        let coordinator = Self::new(store, identity, config);

        if coordinator.config.process.clear_on_startup {
            tracing::warn!(
                key = keys::LOCK_HASH,
                "Clearing lock hash; only safe with a single checker instance per store"
            );
            coordinator
                .store
                .execute(Command::Del {
                    key: keys::LOCK_HASH.to_string(),
                })
                .await?;
        }

        tracing::info!(process_id = %coordinator.identity(), "Health coordinator ready");
        Ok(coordinator)
    }

    pub fn identity(&self) -> &ProcessId {
        self.locks.identity()
    }

    pub fn tracker(&self) -> &MappingTracker {
        &self.tracker
    }

    pub async fn lock_backend(&self, check: &mut Check) -> StoreResult<LockOutcome> {
        self.locks.lock_backend(check).await
    }

    pub async fn is_unlocked_backend(&self, check: &Check) -> StoreResult<bool> {
        self.locks.is_unlocked_backend(check).await
    }

    pub async fn unlock_backend(&self, check: &Check) {
        self.locks.unlock_backend(check).await
    }

    pub async fn mark_backend_dead(&self, check: &Check) -> StoreResult<bool> {
        self.reporter.mark_backend_dead(check).await
    }

    pub async fn mark_backend_alive(&self, check: &Check) -> StoreResult<bool> {
        self.reporter.mark_backend_alive(check).await
    }

    pub async fn ping_alive(&self) {
        self.heartbeat.ping_alive().await
    }

    /// Heartbeat task configured with this process's interval.
    pub fn heartbeat(&self) -> Heartbeat {
        self.heartbeat.clone()
    }

    /// Spawn the eviction listener on the configured channel.
    pub fn listen<F>(&self, callback: F, shutdown: broadcast::Receiver<()>) -> JoinHandle<()>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        EvictionListener::new(
            self.store.clone(),
            self.config.listener.channel.clone(),
            ReconnectPolicy::from_config(&self.config.listener),
        )
        .listen(callback, shutdown)
    }
}
