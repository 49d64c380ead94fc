//! Proxy eviction events.
//!
//! # Data Flow
//! ```text
//! proxy detects a dead backend
//!     → PUBLISH dead "frontend;backend_url;position;total"
//!     → listener.rs (subscription, reconnect on transport error)
//!     → caller's callback with the raw line
//!     → message.rs parses it into an EvictionEvent when needed
//! ```

pub mod listener;
pub mod message;

pub use listener::EvictionListener;
pub use message::{EventParseError, EvictionEvent};
