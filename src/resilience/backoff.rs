//! Fixed reconnect backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::ListenerConfig;

/// Restart policy for long-running subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before every reconnect attempt.
    pub backoff: Duration,
    /// Upper bound of the random delay added to `backoff`.
    pub jitter: Duration,
    /// Consecutive failures tolerated; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    /// Retry forever after a fixed delay.
    pub fn fixed(backoff: Duration) -> Self {
        Self {
            backoff,
            jitter: Duration::ZERO,
            max_attempts: None,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Build the policy described by the listener configuration.
    pub fn from_config(config: &ListenerConfig) -> Self {
        let mut policy = Self::fixed(Duration::from_secs(config.reconnect_backoff_secs))
            .with_jitter(Duration::from_millis(config.reconnect_jitter_ms));
        if config.max_reconnects > 0 {
            policy = policy.with_max_attempts(config.max_reconnects);
        }
        policy
    }

    /// Delay before the next attempt.
    pub fn delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            rand::thread_rng().gen_range(0..jitter_ms)
        } else {
            0
        };
        self.backoff + Duration::from_millis(jitter)
    }

    /// True once `failures` consecutive failures exceed the cap.
    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures > max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(), Duration::from_secs(10));
        assert_eq!(policy.delay(), Duration::from_secs(10));
        assert!(!policy.exhausted(u32::MAX));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(1)).with_jitter(Duration::from_millis(100));
        for _ in 0..50 {
            let delay = policy.delay();
            assert!(delay >= Duration::from_secs(1));
            assert!(delay < Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_attempt_cap() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(1)).with_max_attempts(3);
        assert!(!policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    #[test]
    fn test_from_config() {
        let mut config = ListenerConfig::default();
        assert_eq!(ReconnectPolicy::from_config(&config), ReconnectPolicy::default());

        config.reconnect_backoff_secs = 2;
        config.reconnect_jitter_ms = 250;
        config.max_reconnects = 5;
        let policy = ReconnectPolicy::from_config(&config);
        assert_eq!(policy.backoff, Duration::from_secs(2));
        assert_eq!(policy.jitter, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, Some(5));
    }
}
