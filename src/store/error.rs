//! Store error types.

use thiserror::Error;

/// Errors raised by the coordination store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the store (dial, auth, dropped socket).
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command.
    #[error("Store command failed: {0}")]
    Command(String),

    /// No pooled connection could be handed out.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A pub/sub subscription stopped delivering.
    #[error("Subscription to channel '{0}' closed")]
    SubscriptionClosed(String),

    /// The store answered with something the caller did not expect.
    #[error("Unexpected store reply: {0}")]
    UnexpectedReply(String),

    /// The configured store address cannot be turned into a connection URL.
    #[error("Invalid store address: {0}")]
    InvalidAddress(String),
}

impl StoreError {
    /// True for errors that mean the connection itself is unusable.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::SubscriptionClosed(_) | StoreError::Pool(_)
        )
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
