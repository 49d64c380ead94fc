//! Per-backend distributed locking.
//!
//! # Protocol
//! ```text
//! MULTI
//!   HSETNX hchecker <backend>            1          → lock was free?
//!   HEXISTS hchecker <backend>;<process>            → do we already hold it?
//! EXEC
//!
//! free                     → write token + marker, create notifier, acquired
//! taken, marker present    → join: merge the frontend into our mapping
//! taken, marker absent     → another process owns it
//! ```
//!
//! # Design Decisions
//! - The store's MULTI/EXEC is the only cross-process synchronization
//! - Tokens embed the process identity and a strictly increasing timestamp
//! - Locks carry no lease; a crashed owner's record stays until cleared

pub mod manager;
pub mod token;

pub use manager::{LockManager, LockOutcome};
pub use token::{OwnershipToken, ProcessId, TokenIssuer};
