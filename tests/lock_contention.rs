//! Cross-process lock contention over one shared store.

use std::sync::Arc;

use hchecker::store::keys;
use hchecker::{Check, LockOutcome, MemoryStore};

mod common;

const BACKEND: &str = "http://10.0.0.1:80";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_owner_under_race() {
    let store = Arc::new(MemoryStore::new());
    let processes: Vec<_> = (0..4)
        .map(|i| common::coordinator(&store, &format!("p{}", i)))
        .collect();

    let mut handles = Vec::new();
    for round in 0..8 {
        for process in &processes {
            let process = process.clone();
            handles.push(tokio::spawn(async move {
                let mut check = Check::new(BACKEND, format!("f{}.example.com", round), 0);
                let outcome = process.lock_backend(&mut check).await.unwrap();
                (process.identity().to_string(), outcome, check)
            }));
        }
    }

    let mut owners = Vec::new();
    let mut joined = Vec::new();
    for handle in handles {
        let (id, outcome, check) = handle.await.unwrap();
        match outcome {
            LockOutcome::Acquired(_) => owners.push((id, check)),
            LockOutcome::Joined => joined.push(id),
            LockOutcome::HeldElsewhere => assert!(check.token().is_none()),
        }
    }

    assert_eq!(owners.len(), 1, "exactly one attempt may acquire the lock");
    let (owner_id, owner_check) = &owners[0];
    let token = owner_check.token().unwrap();
    assert!(token.as_str().starts_with(&format!("{};", owner_id)));
    assert_eq!(store.hash_field(keys::LOCK_HASH, BACKEND).as_deref(), Some(token.as_str()));

    // Only the owning process may join its own backend.
    assert!(joined.iter().all(|id| id == owner_id));

    for process in &processes {
        let expected = process.identity().as_str() == owner_id.as_str();
        assert_eq!(process.tracker().snapshot(BACKEND).is_some(), expected);
    }
}

#[tokio::test]
async fn test_released_backend_moves_to_another_process() {
    let store = Arc::new(MemoryStore::new());
    let p1 = common::coordinator(&store, "p1");
    let p2 = common::coordinator(&store, "p2");

    let mut first = Check::new(BACKEND, "www.example.com", 0);
    assert!(p1.lock_backend(&mut first).await.unwrap().is_owned());

    let mut second = Check::new(BACKEND, "www.example.com", 0);
    assert!(matches!(
        p2.lock_backend(&mut second).await.unwrap(),
        LockOutcome::HeldElsewhere
    ));

    p1.unlock_backend(&first).await;
    assert!(p1.is_unlocked_backend(&first).await.unwrap());

    assert!(p2.lock_backend(&mut second).await.unwrap().is_owned());
    assert!(!p2.is_unlocked_backend(&second).await.unwrap());
    assert!(p1.is_unlocked_backend(&first).await.unwrap());
}

#[tokio::test]
async fn test_crashed_owner_is_never_taken_over() {
    let store = Arc::new(MemoryStore::new());
    let crashed = common::coordinator(&store, "p1");
    let mut check = Check::new(BACKEND, "www.example.com", 0);
    assert!(crashed.lock_backend(&mut check).await.unwrap().is_owned());
    drop(crashed);

    let survivor = common::coordinator(&store, "p2");
    let mut attempt = Check::new(BACKEND, "www.example.com", 0);
    assert!(matches!(
        survivor.lock_backend(&mut attempt).await.unwrap(),
        LockOutcome::HeldElsewhere
    ));

    // The same identity coming back joins instead of acquiring.
    let restarted = common::coordinator(&store, "p1");
    let mut rejoin = Check::new(BACKEND, "www.example.com", 0);
    assert!(matches!(
        restarted.lock_backend(&mut rejoin).await.unwrap(),
        LockOutcome::Joined
    ));
}
