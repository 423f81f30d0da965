//! Retry policy for append transactions: attempt count, backoff and loop mode.

use rand::Rng;
use std::time::Duration;

/// Default number of attempts per transaction.
pub const DEFAULT_RETRIES: usize = 5;

/// Default backoff unit; the delay before attempt `n + 1` is `unit * n * rand(1..=3)`.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// How the attempt loop treats a response once one has been obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryMode {
    /// Stop at the first attempt that yields an HTTP response of any status.
    #[default]
    UntilResponse,
    /// Always run every configured attempt and classify the last response
    /// obtained, even if an earlier attempt already succeeded. Transport
    /// failures still sleep before the next attempt, including after the
    /// final one. Mirrors the legacy client.
    Exhaustive,
}

/// Linear backoff with 1-3 units of jitter, scaled by the attempt number.
pub fn backoff_delay(unit: Duration, attempt: usize) -> Duration {
    let jitter: u32 = rand::thread_rng().gen_range(1..=3);
    let factor = u32::try_from(attempt).unwrap_or(u32::MAX).saturating_mul(jitter);
    unit.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_within_jitter_bounds() {
        let unit = Duration::from_millis(100);
        for attempt in 1..=DEFAULT_RETRIES {
            for _ in 0..50 {
                let delay = backoff_delay(unit, attempt);
                assert!(delay >= unit * attempt as u32, "attempt {}: {:?}", attempt, delay);
                assert!(delay <= unit * 3 * attempt as u32, "attempt {}: {:?}", attempt, delay);
            }
        }
    }

    #[test]
    fn test_backoff_delay_is_whole_units() {
        let unit = Duration::from_secs(1);
        for _ in 0..50 {
            let delay = backoff_delay(unit, 2);
            assert!([2, 4, 6].contains(&delay.as_secs()), "{:?}", delay);
        }
    }

    #[test]
    fn test_backoff_delay_zero_unit() {
        assert_eq!(backoff_delay(Duration::ZERO, 4), Duration::ZERO);
    }

    #[test]
    fn test_retry_mode_default() {
        assert_eq!(RetryMode::default(), RetryMode::UntilResponse);
    }
}
