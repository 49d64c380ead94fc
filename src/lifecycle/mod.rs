//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Connect store → Clear lock hash → Start background tasks
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → heartbeat and listener loops exit → process exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Locks are not released on shutdown; restart clears them

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
