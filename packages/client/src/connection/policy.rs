//! Reconnection policy.
//!
//! Pure decisions about whether and when to retry, kept free of I/O so they
//! can be tested directly.

use std::time::Duration;

/// Attempts allowed before the client gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
/// Delay after the first failure.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);
/// Upper bound of the backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Check if the client should attempt to reconnect.
    ///
    /// # Arguments
    ///
    /// * `failures` - Consecutive failures since the last successful handshake
    ///
    /// # Returns
    ///
    /// `true` if reconnection should be attempted, `false` otherwise
    pub fn should_attempt_reconnect(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    ///
    /// Starts at `min_delay`, doubles per failure and never exceeds `max_delay`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.min_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 失敗回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let policy = ReconnectPolicy {
            max_attempts: 5,
            ..ReconnectPolicy::default()
        };

        // when (操作):
        let first = policy.should_attempt_reconnect(0);
        let one_before_limit = policy.should_attempt_reconnect(4);

        // then (期待する結果):
        assert!(first);
        assert!(one_before_limit);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 失敗回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let policy = ReconnectPolicy {
            max_attempts: 5,
            ..ReconnectPolicy::default()
        };

        // when (操作):
        let result = policy.should_attempt_reconnect(5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_delay_doubles_and_is_capped() {
        // テスト項目: 待機時間は最小値から倍々に増え、最大値で頭打ちになる
        // given (前提条件):
        let policy = ReconnectPolicy::default();

        // when (操作):
        let delays: Vec<u64> = (1..=5).map(|n| policy.delay_for(n).as_secs()).collect();

        // then (期待する結果):
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
        assert_eq!(policy.delay_for(1_000), DEFAULT_MAX_DELAY);
    }
}
