//! Reconnect backoff.

use std::time::Duration;

/// Default number of reconnect attempts after a connection is lost.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound on the delay between attempts.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// How the transport retries after an established connection is lost.
///
/// Applies only to reconnects. A failed first connect is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts before giving up. Zero disables reconnecting.
    pub max_attempts: u32,
    /// Delay before the first attempt; doubles after every failure.
    pub initial_delay: Duration,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Never reconnect.
    pub const fn disabled() -> Self {
        Self { max_attempts: 0, initial_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Whether reconnecting is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Whether the 1-based `attempt` may be made.
    pub fn allows(&self, attempt: u32) -> bool {
        (1..=self.max_attempts).contains(&attempt)
    }

    /// Delay before the 1-based `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1 << exponent).min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}
