//! Process identity and ownership tokens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Identity of a checker process, threaded explicitly into every component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identity.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash field recording that this process holds or contests `backend_url`.
    pub fn sync_field(&self, backend_url: &str) -> String {
        format!("{};{}", backend_url, self.0)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value proving ownership of one lock acquisition.
///
/// Format: `<process id>;<unix seconds>.<nanoseconds>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnershipToken(String);

impl OwnershipToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues ownership tokens for one process.
///
/// The timestamp part never repeats within an issuer, even when the wall
/// clock stalls or steps backwards.
#[derive(Debug)]
pub struct TokenIssuer {
    identity: ProcessId,
    last_nanos: AtomicU64,
}

impl TokenIssuer {
    pub fn new(identity: ProcessId) -> Self {
        Self {
            identity,
            last_nanos: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &ProcessId {
        &self.identity
    }

    pub fn issue(&self) -> OwnershipToken {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        self.issue_at(now)
    }

    fn issue_at(&self, now_nanos: u64) -> OwnershipToken {
        let mut issued = now_nanos;
        let _ = self
            .last_nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now_nanos.max(last + 1);
                Some(issued)
            });
        OwnershipToken(format!(
            "{};{}.{}",
            self.identity,
            issued / NANOS_PER_SEC,
            issued % NANOS_PER_SEC
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_format() {
        let issuer = TokenIssuer::new(ProcessId::new("p1"));
        let token = issuer.issue_at(1_700_000_000 * NANOS_PER_SEC + 123_456);
        assert_eq!(token.as_str(), "p1;1700000000.123456");
    }

    #[test]
    fn test_tokens_unique_when_clock_stalls() {
        let issuer = TokenIssuer::new(ProcessId::new("p1"));
        let at = 1_700_000_000 * NANOS_PER_SEC;
        let first = issuer.issue_at(at);
        let second = issuer.issue_at(at);
        let earlier = issuer.issue_at(at - 10);
        assert_eq!(first.as_str(), "p1;1700000000.0");
        assert_eq!(second.as_str(), "p1;1700000000.1");
        assert_eq!(earlier.as_str(), "p1;1700000000.2");
    }

    #[test]
    fn test_tokens_unique_across_threads() {
        let issuer = std::sync::Arc::new(TokenIssuer::new(ProcessId::new("p")));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = issuer.clone();
                std::thread::spawn(move || (0..250).map(|_| issuer.issue()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_sync_field() {
        let id = ProcessId::new("p1");
        assert_eq!(id.sync_field("http://10.0.0.1:80"), "http://10.0.0.1:80;p1");
    }
}
