//! Lock acquisition, ownership checks and release.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::health::Check;
use crate::locking::{ProcessId, TokenIssuer};
use crate::mapping::MappingTracker;
use crate::observability::metrics;
use crate::store::{best_effort, keys, Command, CoordinationStore, Reply, StoreError, StoreResult};

/// Result of a lock attempt.
#[derive(Debug)]
pub enum LockOutcome {
    /// The lock was free and is now ours. The receiver is woken whenever a
    /// frontend is added to this backend's mapping.
    Acquired(mpsc::Receiver<()>),
    /// This process already owns or contests the backend; the check's
    /// frontend was merged into the existing mapping.
    Joined,
    /// Another process owns the backend.
    HeldElsewhere,
}

impl LockOutcome {
    pub fn is_owned(&self) -> bool {
        matches!(self, LockOutcome::Acquired(_))
    }

    /// Consume the outcome, yielding the notifier when the lock was acquired.
    pub fn into_notifier(self) -> Option<mpsc::Receiver<()>> {
        match self {
            LockOutcome::Acquired(rx) => Some(rx),
            _ => None,
        }
    }
}

/// Acquires and releases per-backend ownership for one process.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn CoordinationStore>,
    tokens: Arc<TokenIssuer>,
    tracker: Arc<MappingTracker>,
}

impl LockManager {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        identity: ProcessId,
        tracker: Arc<MappingTracker>,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenIssuer::new(identity)),
            tracker,
        }
    }

    pub fn identity(&self) -> &ProcessId {
        self.tokens.identity()
    }

    /// Try to become the single owner of `check.backend_url`.
    ///
    /// On success the ownership token is attached to `check`.
    pub async fn lock_backend(&self, check: &mut Check) -> StoreResult<LockOutcome> {
        let backend = check.backend_url.clone();
        let sync_field = self.identity().sync_field(&backend);

        let replies = self
            .store
            .transaction(vec![
                Command::HSetNx {
                    key: keys::LOCK_HASH.to_string(),
                    field: backend.clone(),
                    value: keys::LOCK_PLACEHOLDER.to_string(),
                },
                Command::HExists {
                    key: keys::LOCK_HASH.to_string(),
                    field: sync_field.clone(),
                },
            ])
            .await?;

        let (locked, is_mine) = match replies.as_slice() {
            [locked, is_mine] => (locked.as_bool(), is_mine.as_bool()),
            other => {
                return Err(StoreError::UnexpectedReply(format!(
                    "lock transaction returned {} replies",
                    other.len()
                )))
            }
        };

        if !locked {
            if !is_mine {
                tracing::debug!(backend = %backend, "Backend monitored by another process");
                metrics::record_lock_outcome("held_elsewhere");
                return Ok(LockOutcome::HeldElsewhere);
            }
            self.tracker.update_frontend_mapping(check);
            tracing::debug!(
                backend = %backend,
                frontend = %check.frontend_key,
                "Joined backend already owned by this process"
            );
            metrics::record_lock_outcome("joined");
            return Ok(LockOutcome::Joined);
        }

        let token = self.tokens.issue();
        let claimed = self
            .store
            .transaction(vec![
                Command::HSet {
                    key: keys::LOCK_HASH.to_string(),
                    field: backend.clone(),
                    value: token.to_string(),
                },
                Command::HSet {
                    key: keys::LOCK_HASH.to_string(),
                    field: sync_field.clone(),
                    value: keys::MARKER_VALUE.to_string(),
                },
            ])
            .await;

        if let Err(e) = claimed {
            // Leave the backend free for the next attempt instead of stuck on the placeholder.
            best_effort(
                "release placeholder",
                self.store
                    .execute(Command::HDel {
                        key: keys::LOCK_HASH.to_string(),
                        fields: vec![backend.clone()],
                    })
                    .await,
            );
            return Err(e);
        }

        let notifier = self.tracker.register_notifier(&backend);
        self.tracker.update_frontend_mapping(check);

        tracing::debug!(backend = %backend, token = %token, "Backend locked");
        metrics::record_lock_outcome("acquired");
        check.attach_token(token);

        Ok(LockOutcome::Acquired(notifier))
    }

    /// True when the lock record no longer carries this check's token.
    ///
    /// Owners poll this and stop probing once it returns true.
    pub async fn is_unlocked_backend(&self, check: &Check) -> StoreResult<bool> {
        let reply = self
            .store
            .execute(Command::HGet {
                key: keys::LOCK_HASH.to_string(),
                field: check.backend_url.clone(),
            })
            .await?;

        let still_ours = match (check.token(), &reply) {
            (Some(token), Reply::Data(current)) => current == token.as_str(),
            _ => false,
        };
        Ok(!still_ours)
    }

    /// Release the lock and forget the backend's mapping. Idempotent.
    pub async fn unlock_backend(&self, check: &Check) {
        best_effort(
            "release lock",
            self.store
                .execute(Command::HDel {
                    key: keys::LOCK_HASH.to_string(),
                    fields: vec![
                        check.backend_url.clone(),
                        self.identity().sync_field(&check.backend_url),
                    ],
                })
                .await,
        );
        self.tracker.discard(&check.backend_url);
        tracing::debug!(backend = %check.backend_url, "Backend unlocked");
    }
}
