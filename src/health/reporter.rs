//! Dead/alive publication.
//!
//! # State Transitions
//! ```text
//! Dead:  SADD dead:<frontend> <position> + EXPIRE dead:<frontend> <ttl>
//! Alive: SREM dead:<frontend> <position>
//! ```
//! One MULTI/EXEC per report, covering every frontend that still maps to
//! the backend. A backend left without any valid frontend is unlocked and
//! the report returns false so the owner stops probing it.

use std::sync::Arc;
use std::time::Duration;

use crate::health::Check;
use crate::locking::LockManager;
use crate::mapping::{ConsistencyValidator, MappingTracker};
use crate::observability::metrics;
use crate::store::{keys, Command, CoordinationStore, StoreResult};

/// State a backend is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Dead,
    Alive,
}

impl BackendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendState::Dead => "dead",
            BackendState::Alive => "alive",
        }
    }
}

/// Publishes dead/alive transitions for locally owned backends.
#[derive(Clone)]
pub struct StateReporter {
    store: Arc<dyn CoordinationStore>,
    locks: LockManager,
    tracker: Arc<MappingTracker>,
    validator: ConsistencyValidator,
    dead_ttl: Duration,
}

impl StateReporter {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        locks: LockManager,
        tracker: Arc<MappingTracker>,
        dead_ttl: Duration,
    ) -> Self {
        Self {
            validator: ConsistencyValidator::new(store.clone()),
            store,
            locks,
            tracker,
            dead_ttl,
        }
    }

    /// Flag the backend dead for every frontend still mapping to it.
    ///
    /// Returns false when nothing is left to monitor (the backend was unlocked).
    pub async fn mark_backend_dead(&self, check: &Check) -> StoreResult<bool> {
        self.report(check, BackendState::Dead).await
    }

    /// Flag the backend alive for every frontend still mapping to it.
    ///
    /// Returns false when nothing is left to monitor (the backend was unlocked).
    pub async fn mark_backend_alive(&self, check: &Check) -> StoreResult<bool> {
        self.report(check, BackendState::Alive).await
    }

    async fn report(&self, check: &Check, state: BackendState) -> StoreResult<bool> {
        let Some(mut mapping) = self.tracker.snapshot(&check.backend_url) else {
            self.locks.unlock_backend(check).await;
            return Ok(false);
        };

        let entries: Vec<(String, usize)> = mapping
            .iter()
            .map(|(frontend, position)| (frontend.clone(), *position))
            .collect();

        let mut commands = Vec::with_capacity(entries.len() * 2);
        for (frontend_key, position) in entries {
            if !self
                .validator
                .validate(check, &frontend_key, position, &mut mapping)
                .await?
            {
                self.tracker
                    .remove_frontend(&check.backend_url, &frontend_key, position);
                continue;
            }

            let dead_key = keys::dead_key(&frontend_key);
            match state {
                BackendState::Dead => {
                    commands.push(Command::SAdd {
                        key: dead_key.clone(),
                        member: position.to_string(),
                    });
                    commands.push(Command::Expire {
                        key: dead_key,
                        seconds: self.dead_ttl.as_secs(),
                    });
                }
                BackendState::Alive => commands.push(Command::SRem {
                    key: dead_key,
                    member: position.to_string(),
                }),
            }
        }

        self.store.transaction(commands).await?;

        if self.tracker.is_unmapped(&check.backend_url) {
            tracing::info!(
                backend = %check.backend_url,
                "No frontend maps to backend anymore, releasing it"
            );
            self.locks.unlock_backend(check).await;
            return Ok(false);
        }

        tracing::debug!(
            backend = %check.backend_url,
            state = state.as_str(),
            frontends = mapping.len(),
            "Backend state published"
        );
        metrics::record_state_update(state.as_str());
        Ok(true)
    }
}
