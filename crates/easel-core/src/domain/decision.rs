//! Retry decisions on resource contention.
//!
//! The policy is a pure function of the attempt index. The worker reports
//! `Retry` to the transport as a delayed redelivery; nothing sleeps in-process.

use std::time::Duration;

/// What to do when the resource gate refuses an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Ask the transport to redeliver after `delay`.
    Retry { delay: Duration },

    /// Stop trying; the task is finalized as `error`.
    GiveUp,
}

/// Bounded retry with a constant delay between attempts.
///
/// With `max_attempts = 3`, attempts 0 and 1 retry and attempt 2 gives up,
/// so a task sees at most three gate checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,

    /// Delay before each redelivery.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Decide for the attempt with 0-based index `attempt`.
    pub fn decide(&self, attempt: u32) -> Decision {
        if attempt >= self.max_attempts.saturating_sub(1) {
            Decision::GiveUp
        } else {
            Decision::Retry { delay: self.delay }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_policy_is_three_attempts_ten_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(10));
    }

    #[rstest]
    #[case::first(0, Decision::Retry { delay: Duration::from_secs(10) })]
    #[case::second(1, Decision::Retry { delay: Duration::from_secs(10) })]
    #[case::last(2, Decision::GiveUp)]
    #[case::past_budget(7, Decision::GiveUp)]
    fn test_decides_by_attempt_index(#[case] attempt: u32, #[case] expected: Decision) {
        assert_eq!(RetryPolicy::default().decide(attempt), expected);
    }

    #[test]
    fn test_delay_is_constant() {
        let policy = RetryPolicy::new(10, Duration::from_millis(250));
        for attempt in 0..9 {
            assert_eq!(
                policy.decide(attempt),
                Decision::Retry {
                    delay: Duration::from_millis(250)
                }
            );
        }
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1));
        assert_eq!(policy.decide(0), Decision::GiveUp);
    }

    #[test]
    fn test_zero_max_attempts_is_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.decide(0), Decision::GiveUp);
    }
}
