//! Shared utilities for integration tests.

use std::sync::Arc;

use hchecker::store::{keys, Command, CoordinationStore};
use hchecker::{CheckerConfig, HealthCoordinator, MemoryStore, ProcessId};

/// Write `frontend:<frontend>` as the proxy would: reserved slot, then backends.
pub async fn seed_frontend(store: &MemoryStore, frontend: &str, backends: &[&str]) {
    let mut values = vec![frontend.to_string()];
    values.extend(backends.iter().map(|b| b.to_string()));
    store
        .execute(Command::Del { key: keys::frontend_key(frontend) })
        .await
        .unwrap();
    store
        .execute(Command::RPush { key: keys::frontend_key(frontend), values })
        .await
        .unwrap();
}

/// A coordinator for a simulated process sharing `store`, without the startup clear.
pub fn coordinator(store: &Arc<MemoryStore>, id: &str) -> HealthCoordinator {
    let shared: Arc<dyn CoordinationStore> = store.clone();
    HealthCoordinator::new(shared, ProcessId::new(id), CheckerConfig::default())
}
