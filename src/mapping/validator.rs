//! Re-validation of tracked associations against the authoritative list.

use std::sync::Arc;

use crate::health::Check;
use crate::mapping::FrontendMapping;
use crate::observability::metrics;
use crate::store::{keys, Command, CoordinationStore, StoreResult};

/// Guards every dead/alive write against a routing table that changed
/// after the in-process mapping was built.
#[derive(Clone)]
pub struct ConsistencyValidator {
    store: Arc<dyn CoordinationStore>,
}

impl ConsistencyValidator {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }

    /// Check that `frontend:<frontend_key>[position + 1]` still names this
    /// check's backend. A stale association is removed from `mapping`.
    pub async fn validate(
        &self,
        check: &Check,
        frontend_key: &str,
        position: usize,
        mapping: &mut FrontendMapping,
    ) -> StoreResult<bool> {
        let reply = self
            .store
            .execute(Command::LIndex {
                key: keys::frontend_key(frontend_key),
                index: position as i64 + 1,
            })
            .await?;

        if reply.as_str() == Some(check.backend_url.as_str()) {
            return Ok(true);
        }

        tracing::info!(
            backend = %check.backend_url,
            frontend = %frontend_key,
            position,
            found = ?reply.as_str(),
            "Mapping changed"
        );
        metrics::record_mapping_drift();
        mapping.remove(frontend_key);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, frontend: &str, backends: &[&str]) {
        let mut values = vec![frontend.to_string()];
        values.extend(backends.iter().map(|b| b.to_string()));
        store
            .execute(Command::RPush { key: keys::frontend_key(frontend), values })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_matching_entry_is_kept() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "www.example.com", &["http://10.0.0.1:80", "http://10.0.0.2:80"]).await;
        let validator = ConsistencyValidator::new(store);

        let check = Check::new("http://10.0.0.2:80", "www.example.com", 1);
        let mut mapping = FrontendMapping::from([("www.example.com".to_string(), 1)]);

        assert!(validator.validate(&check, "www.example.com", 1, &mut mapping).await.unwrap());
        assert_eq!(mapping.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_entry_is_dropped() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "www.example.com", &["http://10.0.0.2:80"]).await;
        let validator = ConsistencyValidator::new(store);

        let check = Check::new("http://10.0.0.1:80", "www.example.com", 0);
        let mut mapping = FrontendMapping::from([
            ("www.example.com".to_string(), 0),
            ("other.example.com".to_string(), 0),
        ]);

        assert!(!validator.validate(&check, "www.example.com", 0, &mut mapping).await.unwrap());
        assert!(!mapping.contains_key("www.example.com"));
        assert!(mapping.contains_key("other.example.com"));
    }

    #[tokio::test]
    async fn test_missing_list_is_stale() {
        let store = Arc::new(MemoryStore::new());
        let validator = ConsistencyValidator::new(store);

        let check = Check::new("http://10.0.0.1:80", "gone.example.com", 0);
        let mut mapping = FrontendMapping::from([("gone.example.com".to_string(), 0)]);

        assert!(!validator.validate(&check, "gone.example.com", 0, &mut mapping).await.unwrap());
        assert!(mapping.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_mapping() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let validator = ConsistencyValidator::new(store.clone());

        let check = Check::new("http://10.0.0.1:80", "www.example.com", 0);
        let mut mapping = FrontendMapping::from([("www.example.com".to_string(), 0)]);

        assert!(validator.validate(&check, "www.example.com", 0, &mut mapping).await.is_err());
        assert_eq!(mapping.len(), 1);
    }
}
