//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Subscription transport error:
//!     → backoff.rs (fixed delay + optional jitter, optional attempt cap)
//!     → listener reconnects and resubscribes
//! ```
//!
//! # Design Decisions
//! - Only the eviction listener retries; lock and state writes succeed or fail as a unit
//! - Fixed delay by default, jitter opt-in to spread reconnect storms

pub mod backoff;

pub use backoff::ReconnectPolicy;
