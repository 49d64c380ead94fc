//! Key layout shared with the proxy.
//!
//! These names are read and written by the proxy as well, so they must
//! not change.

/// Hash holding lock records (`backend url → token`) and sync markers
/// (`backend url;process id → 1`).
pub const LOCK_HASH: &str = "hchecker";

/// Plain key holding the last heartbeat timestamp.
pub const HEARTBEAT_KEY: &str = "hchecker_ping";

/// Value written into a lock record before the real token is known.
pub const LOCK_PLACEHOLDER: &str = "1";

/// Value of a sync marker field.
pub const MARKER_VALUE: &str = "1";

/// Set of dead backend positions for a frontend.
pub fn dead_key(frontend_key: &str) -> String {
    format!("dead:{}", frontend_key)
}

/// Authoritative backend list for a frontend. Index 0 is reserved, the
/// backend at position `n` lives at index `n + 1`.
pub fn frontend_key(frontend_key: &str) -> String {
    format!("frontend:{}", frontend_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(dead_key("www.example.com"), "dead:www.example.com");
        assert_eq!(frontend_key("www.example.com"), "frontend:www.example.com");
    }
}
