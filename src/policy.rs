// MIT License - Copyright (c) 2026 Peter Wright
// Reconnect and backoff policies

use std::time::Duration;

/// Broker reconnection behavior for the transport pump.
///
/// The pump retries indefinitely; `pause` is the fixed wait between
/// failed poll attempts. Tests shrink it for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait between reconnect attempts after a poll error.
    pub pause: Duration,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            pause: Duration::from_secs(2),
            keep_alive: Duration::from_secs(30),
        }
    }
}

/// Backoff state for the periodic AI fan-speed call.
///
/// The delay starts at `base`, doubles on every rate-limit response up
/// to `cap`, and resets to `base` on any successful call. Rate-limited
/// calls are skipped, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiBackoff {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl AiBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap, current: base }
    }

    /// The delay to wait before the next call.
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// Record a rate-limit response: double the delay, capped.
    pub fn on_rate_limit(&mut self) {
        self.current = (self.current * 2).min(self.cap);
    }

    /// Record a successful call: reset to the baseline.
    pub fn on_success(&mut self) {
        self.current = self.base;
    }
}

impl Default for AiBackoff {
    /// 60 second baseline, 600 second ceiling.
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_on_rate_limit() {
        let mut backoff = AiBackoff::default();
        assert_eq!(backoff.delay(), Duration::from_secs(60));
        backoff.on_rate_limit();
        assert_eq!(backoff.delay(), Duration::from_secs(120));
        backoff.on_rate_limit();
        assert_eq!(backoff.delay(), Duration::from_secs(240));
    }

    #[test]
    fn test_backoff_caps_at_ceiling() {
        let mut backoff = AiBackoff::default();
        for _ in 0..10 {
            backoff.on_rate_limit();
        }
        assert_eq!(backoff.delay(), Duration::from_secs(600));
    }

    #[test]
    fn test_backoff_resets_on_success() {
        let mut backoff = AiBackoff::default();
        backoff.on_rate_limit();
        backoff.on_rate_limit();
        backoff.on_success();
        assert_eq!(backoff.delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_reconnect_defaults() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.pause, Duration::from_secs(2));
        assert_eq!(policy.keep_alive, Duration::from_secs(30));
    }
}
