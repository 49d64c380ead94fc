//! Backend → frontend mapping subsystem.
//!
//! # Data Flow
//! ```text
//! Check arrives (lock acquired or joined)
//!     → tracker.rs merges frontend → position into the backend's entry
//!     → non-blocking wake-up on the backend's notifier (capacity 1)
//!
//! Before every dead/alive publication
//!     → validator.rs reads frontend:<key>[position + 1]
//!     → mismatch: the association is stale, drop it from the mapping
//! ```
//!
//! # Design Decisions
//! - Mappings live only in memory and are rebuilt from incoming checks
//! - Each backend's mapping and notifier form one entry in a concurrent map
//! - Only the task holding a backend's lock mutates that backend's entry
//! - Drift against the authoritative list is expected, never fatal

pub mod tracker;
pub mod validator;

pub use tracker::{FrontendMapping, MappingTracker};
pub use validator::ConsistencyValidator;
