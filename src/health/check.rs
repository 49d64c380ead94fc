//! The unit of probing work handed to the coordinator.

use crate::locking::OwnershipToken;

/// One backend as seen from one frontend.
///
/// Created by the prober for each probe cycle. The only mutation the
/// coordinator performs is attaching the ownership token when the lock
/// is acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Backend URL, also the lock key.
    pub backend_url: String,
    /// Frontend this backend serves.
    pub frontend_key: String,
    /// Position of the backend in the frontend's list (0-based).
    pub backend_id: usize,
    token: Option<OwnershipToken>,
}

impl Check {
    pub fn new(
        backend_url: impl Into<String>,
        frontend_key: impl Into<String>,
        backend_id: usize,
    ) -> Self {
        Self {
            backend_url: backend_url.into(),
            frontend_key: frontend_key.into(),
            backend_id,
            token: None,
        }
    }

    /// Token of the lock this check won, if any.
    pub fn token(&self) -> Option<&OwnershipToken> {
        self.token.as_ref()
    }

    pub(crate) fn attach_token(&mut self, token: OwnershipToken) {
        self.token = Some(token);
    }
}
