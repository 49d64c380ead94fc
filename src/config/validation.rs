//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTL, intervals, pool sizes > 0)
//! - Reject process identities that would corrupt lock keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CheckerConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::CheckerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &CheckerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.store.address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
        _ => errors.push(ValidationError::new(
            "store.address",
            format!("expected host:port, got '{}'", config.store.address),
        )),
    }

    if config.store.max_idle == 0 {
        errors.push(ValidationError::new("store.max_idle", "must be at least 1"));
    }

    if config.store.max_connections < config.store.max_idle {
        errors.push(ValidationError::new(
            "store.max_connections",
            format!(
                "must be >= store.max_idle ({} < {})",
                config.store.max_connections, config.store.max_idle
            ),
        ));
    }

    if config.process.id.contains(';') {
        errors.push(ValidationError::new(
            "process.id",
            "must not contain ';' (token and marker separator)",
        ));
    }

    if config.state.dead_ttl_secs == 0 {
        errors.push(ValidationError::new("state.dead_ttl_secs", "must be greater than 0"));
    }

    if config.listener.channel.trim().is_empty() {
        errors.push(ValidationError::new("listener.channel", "must not be empty"));
    }

    if config.heartbeat.interval_secs == 0 {
        errors.push(ValidationError::new("heartbeat.interval_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
