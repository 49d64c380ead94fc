//! End-to-end probe cycles: lock, report, drift, auto-release.

use std::sync::Arc;
use std::time::Duration;

use hchecker::store::keys;
use hchecker::{Check, MemoryStore};

mod common;

const BACKEND: &str = "http://10.0.0.1:80";

#[tokio::test(start_paused = true)]
async fn test_dead_set_expires_without_refresh() {
    let store = Arc::new(MemoryStore::new());
    common::seed_frontend(&store, "www.example.com", &[BACKEND]).await;
    let checker = common::coordinator(&store, "p1");

    let mut check = Check::new(BACKEND, "www.example.com", 0);
    checker.lock_backend(&mut check).await.unwrap();
    assert!(checker.mark_backend_dead(&check).await.unwrap());
    assert_eq!(store.set_members("dead:www.example.com"), vec!["0".to_string()]);

    tokio::time::advance(Duration::from_secs(45)).await;
    assert!(checker.mark_backend_dead(&check).await.unwrap());
    tokio::time::advance(Duration::from_secs(45)).await;
    assert_eq!(store.set_members("dead:www.example.com"), vec!["0".to_string()]);

    tokio::time::advance(Duration::from_secs(16)).await;
    assert!(store.set_members("dead:www.example.com").is_empty());
}

#[tokio::test]
async fn test_frontend_rewired_while_dead() {
    let store = Arc::new(MemoryStore::new());
    common::seed_frontend(&store, "www.example.com", &[BACKEND]).await;
    let checker = common::coordinator(&store, "p1");

    let mut check = Check::new(BACKEND, "www.example.com", 0);
    let mut notifier = checker
        .lock_backend(&mut check)
        .await
        .unwrap()
        .into_notifier()
        .unwrap();
    assert!(notifier.try_recv().is_ok());
    assert!(checker.mark_backend_dead(&check).await.unwrap());

    // The proxy's routing table now points position 0 elsewhere.
    common::seed_frontend(&store, "www.example.com", &["http://10.0.0.2:80"]).await;

    assert!(!checker.mark_backend_alive(&check).await.unwrap());
    assert!(checker.is_unlocked_backend(&check).await.unwrap());
    assert_eq!(store.hash_field(keys::LOCK_HASH, BACKEND), None);
    assert!(checker.tracker().is_empty());

    // The stale dead entry was not touched by the rejected report.
    assert_eq!(store.set_members("dead:www.example.com"), vec!["0".to_string()]);
}

#[tokio::test]
async fn test_new_frontend_wakes_owner_and_is_reported() {
    let store = Arc::new(MemoryStore::new());
    common::seed_frontend(&store, "a.example.com", &[BACKEND]).await;
    common::seed_frontend(&store, "b.example.com", &["http://10.0.0.7:80", BACKEND]).await;
    let checker = common::coordinator(&store, "p1");

    let mut check = Check::new(BACKEND, "a.example.com", 0);
    let mut notifier = checker
        .lock_backend(&mut check)
        .await
        .unwrap()
        .into_notifier()
        .unwrap();
    notifier.recv().await.unwrap();

    let mut joiner = Check::new(BACKEND, "b.example.com", 1);
    checker.lock_backend(&mut joiner).await.unwrap();
    notifier.recv().await.unwrap();

    assert!(checker.mark_backend_dead(&check).await.unwrap());
    assert_eq!(store.set_members("dead:a.example.com"), vec!["0".to_string()]);
    assert_eq!(store.set_members("dead:b.example.com"), vec!["1".to_string()]);
}

#[tokio::test]
async fn test_heartbeat_through_coordinator() {
    let store = Arc::new(MemoryStore::new());
    let checker = common::coordinator(&store, "p1");
    checker.ping_alive().await;
    assert!(store.string_value(keys::HEARTBEAT_KEY).is_some());
}
