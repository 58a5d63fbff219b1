use std::time::Duration;

/// How a single attempt failed, as far as retrying is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429 returned by the provider
    RateLimitStatus,
    /// Rate limiting reported by the transport layer rather than a status code
    RateLimitSignal,
    /// The attempt exceeded its timeout
    Timeout,
    /// Anything else; never retried
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Decides whether and when a failed attempt is retried.
///
/// `attempt` is 1-based and counts the attempt that just failed.
pub trait RetryPolicy: Send + Sync {
    fn max_attempts(&self) -> u32;

    fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision;
}

/// Linear backoff scaled per failure kind:
/// 429 waits `base × attempt × 2`, transport rate limits `base × attempt × 3`,
/// timeouts `base × attempt`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }
}

impl RetryPolicy for BackoffPolicy {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn decide(&self, kind: FailureKind, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let factor = match kind {
            FailureKind::RateLimitStatus => attempt * 2,
            FailureKind::RateLimitSignal => attempt * 3,
            FailureKind::Timeout => attempt,
            FailureKind::Fatal => return RetryDecision::GiveUp,
        };

        RetryDecision::RetryAfter(self.base_delay * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(decision: RetryDecision) -> Duration {
        match decision {
            RetryDecision::RetryAfter(d) => d,
            RetryDecision::GiveUp => panic!("expected a retry"),
        }
    }

    #[test]
    fn test_rate_limit_delays_strictly_increase() {
        let policy = BackoffPolicy::default();
        let first = delay(policy.decide(FailureKind::RateLimitStatus, 1));
        let second = delay(policy.decide(FailureKind::RateLimitStatus, 2));

        assert_eq!(first, Duration::from_secs(2));
        assert_eq!(second, Duration::from_secs(4));
        assert!(second > first);
        assert_eq!(
            policy.decide(FailureKind::RateLimitStatus, 3),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_backoff_factors_per_kind() {
        let policy = BackoffPolicy::new(3, Duration::from_millis(100));

        assert_eq!(
            delay(policy.decide(FailureKind::RateLimitSignal, 2)),
            Duration::from_millis(600)
        );
        assert_eq!(
            delay(policy.decide(FailureKind::Timeout, 2)),
            Duration::from_millis(200)
        );
        assert_eq!(policy.decide(FailureKind::Fatal, 1), RetryDecision::GiveUp);
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        let policy = BackoffPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.decide(FailureKind::Timeout, 1), RetryDecision::GiveUp);
    }
}
