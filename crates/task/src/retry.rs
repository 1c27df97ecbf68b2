//! Retry policy and backoff computation.

use std::collections::HashSet;
use std::time::Duration;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Always `initial_delay`.
    Fixed,
    /// `initial_delay * attempt`.
    Linear,
    /// `initial_delay * exponent^(attempt - 1)`.
    Exponential,
}

/// Governs retry attempts for a task.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, at least 1.
    pub max_attempts: u32,
    /// Backoff shape applied between attempts.
    pub backoff_strategy: BackoffStrategy,
    /// Delay before the second attempt (and base for later computations).
    pub initial_delay: Duration,
    /// Delay is clamped to this ceiling.
    pub max_delay: Duration,
    /// If non-empty, only errors whose kind/message matches one of these
    /// strings are retried; any other error breaks the retry loop.
    pub retryable_error_kinds: Option<HashSet<String>>,
    /// Whether a `TIMEOUT` failure is retryable. Defaults to `false`.
    pub retry_on_timeout: bool,
    /// Base of the exponential backoff formula. Defaults to `2`.
    pub exponent: u32,
}

impl RetryPolicy {
    /// A single-attempt, no-retry policy.
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff_strategy: BackoffStrategy::Fixed,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            retryable_error_kinds: None,
            retry_on_timeout: false,
            exponent: 2,
        }
    }

    /// A fixed-delay policy retrying up to `max_attempts` times.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff_strategy: BackoffStrategy::Fixed,
            initial_delay: delay,
            max_delay: delay,
            retryable_error_kinds: None,
            retry_on_timeout: false,
            exponent: 2,
        }
    }

    /// Whether an error of kind/message `code` is retryable under this
    /// policy: if `retryableErrorKinds` is non-empty and the error's
    /// kind/message is not in it, the retry loop breaks.
    #[must_use]
    pub fn is_retryable(&self, code: &str) -> bool {
        match &self.retryable_error_kinds {
            Some(kinds) => kinds.contains(code),
            None => true,
        }
    }

    /// Delay before `attempt + 1`, per the configured backoff strategy,
    /// clamped to `max_delay`.
    #[must_use]
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let raw = match self.backoff_strategy {
            BackoffStrategy::Fixed => self.initial_delay,
            BackoffStrategy::Linear => self.initial_delay * attempt,
            BackoffStrategy::Exponential => {
                let factor = self.exponent.saturating_pow(attempt.saturating_sub(1));
                self.initial_delay * factor
            }
        };
        raw.min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_backoff_is_constant() {
        let policy = RetryPolicy {
            backoff_strategy: BackoffStrategy::Fixed,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            ..RetryPolicy::once()
        };
        assert_eq!(policy.compute_delay(1), Duration::from_millis(10));
        assert_eq!(policy.compute_delay(5), Duration::from_millis(10));
    }

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let policy = RetryPolicy {
            backoff_strategy: BackoffStrategy::Linear,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(1000),
            ..RetryPolicy::once()
        };
        assert_eq!(policy.compute_delay(3), Duration::from_millis(30));
    }

    #[test]
    fn exponential_backoff_doubles_by_default() {
        let policy = RetryPolicy {
            backoff_strategy: BackoffStrategy::Exponential,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(1000),
            ..RetryPolicy::once()
        };
        assert_eq!(policy.compute_delay(1), Duration::from_millis(10));
        assert_eq!(policy.compute_delay(2), Duration::from_millis(20));
        assert_eq!(policy.compute_delay(3), Duration::from_millis(40));
    }

    #[test]
    fn exponential_backoff_clamps_to_max_delay() {
        let policy = RetryPolicy {
            backoff_strategy: BackoffStrategy::Exponential,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(35),
            ..RetryPolicy::once()
        };
        assert_eq!(policy.compute_delay(3), Duration::from_millis(35));
    }

    #[test]
    fn monotonic_up_to_clamp() {
        let policy = RetryPolicy {
            backoff_strategy: BackoffStrategy::Exponential,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_secs(10),
            ..RetryPolicy::once()
        };
        let mut previous = Duration::ZERO;
        for attempt in 1..=8 {
            let delay = policy.compute_delay(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn retryable_error_kinds_gate_retry() {
        let mut kinds = HashSet::new();
        kinds.insert("TRANSIENT".to_string());
        let policy = RetryPolicy {
            retryable_error_kinds: Some(kinds),
            ..RetryPolicy::once()
        };
        assert!(policy.is_retryable("TRANSIENT"));
        assert!(!policy.is_retryable("FATAL"));
    }

    #[test]
    fn empty_retryable_set_means_everything_is_retryable() {
        let policy = RetryPolicy::once();
        assert!(policy.is_retryable("ANYTHING"));
    }
}
