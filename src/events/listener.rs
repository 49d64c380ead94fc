//! Eviction channel listener.
//!
//! # Responsibilities
//! - Subscribe to the proxy's eviction channel
//! - Hand every message to the caller's callback
//! - Reconnect after transport errors, following a `ReconnectPolicy`
//! - Stop on the shutdown signal

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::observability::metrics;
use crate::resilience::ReconnectPolicy;
use crate::store::CoordinationStore;

/// Background subscriber for proxy-originated eviction notices.
pub struct EvictionListener {
    store: Arc<dyn CoordinationStore>,
    channel: String,
    policy: ReconnectPolicy,
}

impl EvictionListener {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        channel: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            store,
            channel: channel.into(),
            policy,
        }
    }

    /// Spawn the listener. `callback` receives each raw message line.
    ///
    /// The task ends only on shutdown or when the policy gives up.
    pub fn listen<F>(self, callback: F, shutdown: broadcast::Receiver<()>) -> JoinHandle<()>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        tokio::spawn(self.run(callback, shutdown))
    }

    async fn run<F>(self, callback: F, mut shutdown: broadcast::Receiver<()>)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut failures = 0u32;

        loop {
            let mut subscription = match self.store.subscribe(&self.channel).await {
                Ok(subscription) => {
                    failures = 0;
                    tracing::info!(channel = %self.channel, "Subscribed to eviction channel");
                    subscription
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(channel = %self.channel, error = %e, failures, "Subscribe failed");
                    if !self.wait_before_retry(failures, &mut shutdown).await {
                        return;
                    }
                    continue;
                }
            };

            loop {
                tokio::select! {
                    received = subscription.next_message() => match received {
                        Ok(line) => callback(line),
                        Err(e) => {
                            tracing::warn!(channel = %self.channel, error = %e, "Eviction subscription lost");
                            break;
                        }
                    },
                    _ = shutdown.recv() => {
                        tracing::info!(channel = %self.channel, "Eviction listener received shutdown signal, exiting loop");
                        return;
                    }
                }
            }

            drop(subscription);
            failures += 1;
            if !self.wait_before_retry(failures, &mut shutdown).await {
                return;
            }
        }
    }

    /// Sleep out the backoff. Returns false when the listener must stop.
    async fn wait_before_retry(&self, failures: u32, shutdown: &mut broadcast::Receiver<()>) -> bool {
        if self.policy.exhausted(failures) {
            tracing::error!(
                channel = %self.channel,
                failures,
                "Giving up on eviction channel after repeated failures"
            );
            return false;
        }

        let delay = self.policy.delay();
        tracing::info!(channel = %self.channel, delay_ms = delay.as_millis() as u64, "Reconnecting to eviction channel");
        metrics::record_listener_reconnect();

        tokio::select! {
            _ = time::sleep(delay) => true,
            _ = shutdown.recv() => false,
        }
    }
}
