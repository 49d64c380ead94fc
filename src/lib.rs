//! Distributed lock and dead/alive state coordination for health checkers
//! running behind a multi-process reverse proxy.

pub mod config;
pub mod events;
pub mod health;
pub mod lifecycle;
pub mod locking;
pub mod mapping;
pub mod observability;
pub mod resilience;
pub mod store;

pub use config::CheckerConfig;
pub use events::{EvictionEvent, EvictionListener};
pub use health::{Check, HealthCoordinator};
pub use lifecycle::Shutdown;
pub use locking::{LockOutcome, ProcessId};
pub use store::{CoordinationStore, MemoryStore, RedisStore};
