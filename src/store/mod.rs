//! Coordination store subsystem.
//!
//! # Data Flow
//! ```text
//! Lock manager / state reporter / validator / heartbeat
//!     → Command (one primitive) or Vec<Command> (MULTI/EXEC)
//!     → CoordinationStore
//!         → RedisStore  (pooled connections, PING-verified on reuse)
//!         → MemoryStore (in-process, used by tests)
//!     → Reply per command
//!
//! Eviction listener:
//!     subscribe(channel) → Subscription::next_message() until Err
//! ```
//!
//! # Design Decisions
//! - Commands are plain data so the same transaction can run against either backend
//! - A transaction either applies every command or none of them
//! - `Subscription::next_message` returning `Err` always means the transport is gone

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// A single store primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a hash field only if it does not exist yet.
    HSetNx { key: String, field: String, value: String },
    HSet { key: String, field: String, value: String },
    HExists { key: String, field: String },
    HGet { key: String, field: String },
    HDel { key: String, fields: Vec<String> },
    Del { key: String },
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
    /// Expire the whole key after `seconds`.
    Expire { key: String, seconds: u64 },
    /// Positional list read; negative indexes count from the tail.
    LIndex { key: String, index: i64 },
    RPush { key: String, values: Vec<String> },
    Set { key: String, value: String },
}

/// Reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Ok,
    Int(i64),
    Data(String),
}

impl Reply {
    /// Integer replies from HSETNX/HEXISTS/SADD are booleans in disguise.
    pub fn as_bool(&self) -> bool {
        matches!(self, Reply::Int(n) if *n != 0)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Data(s) => Some(s),
            _ => None,
        }
    }
}

/// An open pub/sub subscription.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message payload.
    ///
    /// An error means the underlying connection is unusable and the
    /// subscription must be re-established.
    async fn next_message(&mut self) -> StoreResult<String>;
}

/// The shared store every checker process coordinates through.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Run one command on a pooled connection.
    async fn execute(&self, command: Command) -> StoreResult<Reply>;

    /// Run all commands atomically (MULTI/EXEC), returning one reply per command.
    async fn transaction(&self, commands: Vec<Command>) -> StoreResult<Vec<Reply>>;

    /// Publish a message, returning the number of receivers.
    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize>;

    /// Open a dedicated subscription to `channel`.
    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>>;
}

/// Log and swallow the failure of a write nobody depends on.
pub(crate) fn best_effort<T>(operation: &'static str, result: StoreResult<T>) {
    if let Err(e) = result {
        tracing::warn!(operation, error = %e, "Best-effort store write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_helpers() {
        assert!(Reply::Int(1).as_bool());
        assert!(!Reply::Int(0).as_bool());
        assert!(!Reply::Nil.as_bool());
        assert_eq!(Reply::Data("x".into()).as_str(), Some("x"));
        assert_eq!(Reply::Ok.as_str(), None);
    }
}
