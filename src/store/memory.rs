//! In-process coordination store.
//!
//! Mirrors the subset of Redis semantics the checker relies on: hashes,
//! sets, lists and plain keys, key expiry, MULTI/EXEC atomicity and
//! pub/sub fan-out. Several simulated processes can share one instance.
//!
//! Fault injection (`set_offline`, `sever_subscriptions`) lets tests
//! exercise the error paths without a real server.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::store::{Command, CoordinationStore, Reply, StoreError, StoreResult, Subscription};

#[derive(Debug, Default)]
struct State {
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    lists: HashMap<String, Vec<String>>,
    strings: HashMap<String, String>,
    deadlines: HashMap<String, Instant>,
}

impl State {
    fn exists(&self, key: &str) -> bool {
        self.hashes.contains_key(key)
            || self.sets.contains_key(key)
            || self.lists.contains_key(key)
            || self.strings.contains_key(key)
    }

    fn remove_key(&mut self, key: &str) -> bool {
        let removed = self.hashes.remove(key).is_some()
            | self.sets.remove(key).is_some()
            | self.lists.remove(key).is_some()
            | self.strings.remove(key).is_some();
        self.deadlines.remove(key);
        removed
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove_key(&key);
        }
    }

    fn apply(&mut self, command: Command) -> Reply {
        match command {
            Command::HSetNx { key, field, value } => {
                let hash = self.hashes.entry(key).or_default();
                if hash.contains_key(&field) {
                    Reply::Int(0)
                } else {
                    hash.insert(field, value);
                    Reply::Int(1)
                }
            }
            Command::HSet { key, field, value } => {
                let created = self.hashes.entry(key).or_default().insert(field, value).is_none();
                Reply::Int(i64::from(created))
            }
            Command::HExists { key, field } => {
                let exists = self.hashes.get(&key).is_some_and(|h| h.contains_key(&field));
                Reply::Int(i64::from(exists))
            }
            Command::HGet { key, field } => self
                .hashes
                .get(&key)
                .and_then(|h| h.get(&field))
                .map_or(Reply::Nil, |v| Reply::Data(v.clone())),
            Command::HDel { key, fields } => {
                let mut removed = 0;
                if let Some(hash) = self.hashes.get_mut(&key) {
                    for field in &fields {
                        if hash.remove(field).is_some() {
                            removed += 1;
                        }
                    }
                    if hash.is_empty() {
                        self.remove_key(&key);
                    }
                }
                Reply::Int(removed)
            }
            Command::Del { key } => Reply::Int(i64::from(self.remove_key(&key))),
            Command::SAdd { key, member } => {
                Reply::Int(i64::from(self.sets.entry(key).or_default().insert(member)))
            }
            Command::SRem { key, member } => {
                let mut removed = false;
                if let Some(set) = self.sets.get_mut(&key) {
                    removed = set.remove(&member);
                    if set.is_empty() {
                        self.remove_key(&key);
                    }
                }
                Reply::Int(i64::from(removed))
            }
            Command::Expire { key, seconds } => {
                if !self.exists(&key) {
                    return Reply::Int(0);
                }
                self.deadlines.insert(key, Instant::now() + Duration::from_secs(seconds));
                Reply::Int(1)
            }
            Command::LIndex { key, index } => {
                let Some(list) = self.lists.get(&key) else {
                    return Reply::Nil;
                };
                let len = list.len() as i64;
                let index = if index < 0 { len + index } else { index };
                if index < 0 || index >= len {
                    return Reply::Nil;
                }
                Reply::Data(list[index as usize].clone())
            }
            Command::RPush { key, values } => {
                let list = self.lists.entry(key).or_default();
                list.extend(values);
                Reply::Int(list.len() as i64)
            }
            Command::Set { key, value } => {
                self.deadlines.remove(&key);
                self.strings.insert(key, value);
                Reply::Ok
            }
        }
    }
}

/// In-memory `CoordinationStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
    subscriptions_opened: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Drop every open subscription, as if the server closed the sockets.
    pub fn sever_subscriptions(&self) {
        self.subscribers.lock().clear();
    }

    /// Number of successful `subscribe` calls so far.
    pub fn subscriptions_opened(&self) -> usize {
        self.subscriptions_opened.load(Ordering::SeqCst)
    }

    pub fn hash_field(&self, key: &str, field: &str) -> Option<String> {
        let mut state = self.state.lock();
        state.purge_expired(Instant::now());
        state.hashes.get(key).and_then(|h| h.get(field)).cloned()
    }

    /// Sorted members of a set.
    pub fn set_members(&self, key: &str) -> Vec<String> {
        let mut state = self.state.lock();
        state.purge_expired(Instant::now());
        let mut members: Vec<String> = state
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    pub fn string_value(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        state.purge_expired(Instant::now());
        state.strings.get(key).cloned()
    }

    /// Remaining time to live of a key, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.purge_expired(now);
        state.deadlines.get(key).map(|deadline| deadline.saturating_duration_since(now))
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn execute(&self, command: Command) -> StoreResult<Reply> {
        self.ensure_online()?;
        let mut state = self.state.lock();
        state.purge_expired(Instant::now());
        Ok(state.apply(command))
    }

    async fn transaction(&self, commands: Vec<Command>) -> StoreResult<Vec<Reply>> {
        self.ensure_online()?;
        let mut state = self.state.lock();
        state.purge_expired(Instant::now());
        Ok(commands.into_iter().map(|c| state.apply(c)).collect())
    }

    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize> {
        self.ensure_online()?;
        let mut subscribers = self.subscribers.lock();
        let Some(senders) = subscribers.get_mut(channel) else {
            return Ok(0);
        };
        senders.retain(|tx| tx.send(message.to_string()).is_ok());
        Ok(senders.len())
    }

    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>> {
        self.ensure_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        self.subscriptions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySubscription {
            channel: channel.to_string(),
            rx,
        }))
    }
}

struct MemorySubscription {
    channel: String,
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_message(&mut self) -> StoreResult<String> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| StoreError::SubscriptionClosed(self.channel.clone()))
    }
}
