use std::time::Duration;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how long the client waits before each
/// automatic reconnection attempt after an abnormal close.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the given reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (1-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Attempts are exhausted
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Maximum number of automatic attempts before giving up
    fn max_attempts(&self) -> u32;
}

/// Linear backoff reconnection strategy
///
/// The nth attempt waits `base_interval * n`.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_interval: Duration,
    max_attempts: u32,
}

impl LinearBackoff {
    /// Default base interval between attempts
    pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_millis(5000);

    /// Default number of automatic attempts
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(base_interval: Duration, max_attempts: u32) -> Self {
        Self {
            base_interval,
            max_attempts,
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_INTERVAL, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReconnectionStrategy for LinearBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_interval.saturating_mul(attempt))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Exponential backoff reconnection strategy
///
/// Delays grow as `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
