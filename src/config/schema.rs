//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the checker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::locking::ProcessId;

/// Root configuration for a checker process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CheckerConfig {
    /// Coordination store connection settings.
    pub store: StoreConfig,

    /// Identity of this process.
    pub process: ProcessConfig,

    /// Dead/alive publication settings.
    pub state: StateConfig,

    /// Eviction channel listener.
    pub listener: ListenerConfig,

    /// Liveness heartbeat.
    pub heartbeat: HeartbeatConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Coordination store (Redis) connection pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store address (e.g., "localhost:6379").
    pub address: String,

    /// AUTH secret; empty means no authentication.
    pub password: String,

    /// Idle connections kept for reuse.
    pub max_idle: usize,

    /// Hard limit on pooled connections.
    pub max_connections: usize,

    /// Idle connections unused for longer than this are closed.
    pub idle_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: "localhost:6379".to_string(),
            password: String::new(),
            max_idle: 3,
            max_connections: 64,
            idle_timeout_secs: 120,
        }
    }
}

/// Process identity settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Explicit identity; a random one is generated when empty.
    pub id: String,

    /// Delete the whole lock hash at startup.
    ///
    /// Only safe when this process is the sole checker using the store.
    pub clear_on_startup: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            clear_on_startup: true,
        }
    }
}

impl ProcessConfig {
    /// Resolve the identity this process runs under.
    pub fn identity(&self) -> ProcessId {
        if self.id.is_empty() {
            ProcessId::random()
        } else {
            ProcessId::new(self.id.clone())
        }
    }
}

/// Dead/alive publication settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StateConfig {
    /// Expiry of `dead:<frontend>` sets, refreshed on every dead report.
    pub dead_ttl_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self { dead_ttl_secs: 60 }
    }
}

/// Eviction channel listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Start the listener.
    pub enabled: bool,

    /// Pub/sub channel the proxy publishes dead backends on.
    pub channel: String,

    /// Fixed delay before reconnecting after a transport error.
    pub reconnect_backoff_secs: u64,

    /// Random extra delay (0..jitter) added to each backoff.
    pub reconnect_jitter_ms: u64,

    /// Consecutive failed reconnects before giving up (0 = never).
    pub max_reconnects: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "dead".to_string(),
            reconnect_backoff_secs: 10,
            reconnect_jitter_ms: 0,
            max_reconnects: 0,
        }
    }
}

/// Heartbeat configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Periodically write the heartbeat key.
    pub enabled: bool,

    /// Heartbeat interval in seconds.
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
