//! Health coordination subsystem.
//!
//! # Data Flow
//! ```text
//! Prober task for one backend:
//!     Check → coordinator.lock_backend()
//!         → Acquired(notifier): probe loop
//!             probe result → mark_backend_dead / mark_backend_alive
//!                 → reporter.rs validates mappings, publishes dead:<frontend>
//!                 → false: nothing left to watch, lock already released
//!             is_unlocked_backend() true → stop
//!             notifier woken → a frontend was added, re-evaluate
//!         → Joined / HeldElsewhere: nothing to run
//!
//! Background:
//!     heartbeat.rs → hchecker_ping every interval
//! ```
//!
//! # Design Decisions
//! - The probe itself lives outside this crate; only its outcome comes in
//! - Callers must not report state before `lock_backend` returned ownership
//! - Reports are all-or-nothing per backend (one MULTI/EXEC)

pub mod check;
pub mod coordinator;
pub mod heartbeat;
pub mod reporter;

pub use check::Check;
pub use coordinator::HealthCoordinator;
pub use heartbeat::Heartbeat;
pub use reporter::{BackendState, StateReporter};
