//! Eviction message format: `frontend;backend_url;position;total`.

use std::str::FromStr;

use thiserror::Error;

use crate::health::Check;

/// Errors raised while parsing an eviction message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("expected 4 ';'-separated fields, got {0}")]
    FieldCount(usize),

    #[error("field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("position {position} out of range for {total} backends")]
    PositionOutOfRange { position: usize, total: usize },
}

/// A dead-backend notification published by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionEvent {
    pub frontend_key: String,
    pub backend_url: String,
    pub backend_id: usize,
    pub backend_count: usize,
}

impl EvictionEvent {
    /// The check a prober should start for this event.
    pub fn to_check(&self) -> Check {
        Check::new(self.backend_url.clone(), self.frontend_key.clone(), self.backend_id)
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, EventParseError> {
    if value.is_empty() {
        return Err(EventParseError::EmptyField(field));
    }
    Ok(value.to_string())
}

fn number(field: &'static str, value: &str) -> Result<usize, EventParseError> {
    value.parse().map_err(|_| EventParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

impl FromStr for EvictionEvent {
    type Err = EventParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(';').collect();
        let [frontend, backend, position, total] = fields.as_slice() else {
            return Err(EventParseError::FieldCount(fields.len()));
        };

        let event = Self {
            frontend_key: non_empty("frontend", frontend)?,
            backend_url: non_empty("backend_url", backend)?,
            backend_id: number("position", position)?,
            backend_count: number("total", total)?,
        };

        if event.backend_id >= event.backend_count {
            return Err(EventParseError::PositionOutOfRange {
                position: event.backend_id,
                total: event.backend_count,
            });
        }

        Ok(event)
    }
}
