//! Blocking retry with exponential backoff.
//!
//! No jitter and no error wrapping: the final failure is handed back exactly
//! as the wrapped call produced it, so callers can still inspect the root
//! cause after the budget runs out.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Attempt budget and backoff base for one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Clamped to at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before attempt `attempt` (1-indexed): `base * 2^(attempt - 2)`.
    /// The first attempt never waits.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(2))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping the exponential
/// delay between attempts. Returns the first success or the final failure
/// unmodified.
pub fn with_retry<T, E, F>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %err, "call failed, backing off");
                thread::sleep(policy.backoff_delay(attempt + 1));
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("retry loop always returns within max_attempts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result: Result<&str, String> = with_retry(&no_delay(3), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(format!("transient {}", calls.get()))
            } else {
                Ok("ok-response")
            }
        });
        assert_eq!(result.unwrap(), "ok-response");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn propagates_final_failure_unmodified() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = with_retry(&no_delay(2), || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        });
        assert_eq!(result.unwrap_err(), "failure 2");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn zero_attempts_clamps_to_one() {
        let calls = Cell::new(0u32);
        let result: Result<(), &str> = with_retry(&no_delay(0), || {
            calls.set(calls.get() + 1);
            Err("nope")
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::ZERO);
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(4));
    }
}
