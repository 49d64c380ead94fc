//! In-process backend → {frontend → position} mapping.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::health::Check;
use crate::observability::metrics;

/// Frontend key → backend position within that frontend.
pub type FrontendMapping = HashMap<String, usize>;

#[derive(Debug, Default)]
struct BackendEntry {
    frontends: FrontendMapping,
    /// Wakes the lock owner when a frontend is added.
    notifier: Option<mpsc::Sender<()>>,
}

/// Tracks which frontends each locally owned backend serves.
#[derive(Debug, Default)]
pub struct MappingTracker {
    backends: DashMap<String, BackendEntry>,
}

impl MappingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `check.frontend_key → check.backend_id` and wake the owner.
    ///
    /// The wake-up is dropped when one is already pending.
    pub fn update_frontend_mapping(&self, check: &Check) {
        let mut entry = self.backends.entry(check.backend_url.clone()).or_default();
        entry
            .frontends
            .insert(check.frontend_key.clone(), check.backend_id);

        if let Some(notifier) = &entry.notifier {
            let _ = notifier.try_send(());
        }
        drop(entry);

        metrics::record_tracked_backends(self.backends.len());
    }

    /// Create the backend's notifier, replacing any previous one.
    pub fn register_notifier(&self, backend_url: &str) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel(1);
        self.backends
            .entry(backend_url.to_string())
            .or_default()
            .notifier = Some(tx);
        rx
    }

    /// Copy of the backend's current mapping, `None` when untracked.
    pub fn snapshot(&self, backend_url: &str) -> Option<FrontendMapping> {
        self.backends
            .get(backend_url)
            .map(|entry| entry.frontends.clone())
    }

    /// Drop one frontend, unless it was re-associated with another position meanwhile.
    pub fn remove_frontend(&self, backend_url: &str, frontend_key: &str, position: usize) {
        if let Some(mut entry) = self.backends.get_mut(backend_url) {
            if entry.frontends.get(frontend_key) == Some(&position) {
                entry.frontends.remove(frontend_key);
            }
        }
    }

    /// True when the backend has no frontend left (or is not tracked at all).
    pub fn is_unmapped(&self, backend_url: &str) -> bool {
        self.backends
            .get(backend_url)
            .map_or(true, |entry| entry.frontends.is_empty())
    }

    pub fn has_notifier(&self, backend_url: &str) -> bool {
        self.backends
            .get(backend_url)
            .is_some_and(|entry| entry.notifier.is_some())
    }

    /// Forget the backend's mapping and notifier.
    pub fn discard(&self, backend_url: &str) {
        self.backends.remove(backend_url);
        metrics::record_tracked_backends(self.backends.len());
    }

    /// Number of backends with an entry.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
