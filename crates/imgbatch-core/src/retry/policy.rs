use std::time::Duration;

use crate::outcome::FailureReason;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The failure is terminal.
    GiveUp,
    /// Re-admit the job after the given delay.
    RetryAfter(Duration),
}

/// Constant-delay retry policy.
///
/// The delay does not grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Fixed delay before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 2,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Decide what to do after `attempts_so_far` failed attempts (1-based) ending in `reason`.
    pub fn decide(&self, attempts_so_far: u32, reason: &FailureReason) -> RetryDecision {
        if !self.enabled || attempts_so_far >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        match reason {
            FailureReason::Timeout
            | FailureReason::ExecutionError(_)
            | FailureReason::AbnormalExit(_) => RetryDecision::RetryAfter(self.delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            enabled: true,
            max_attempts,
            delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn disabled_never_retries() {
        let p = RetryPolicy {
            enabled: false,
            ..policy(5)
        };
        assert_eq!(p.decide(1, &FailureReason::Timeout), RetryDecision::GiveUp);
    }

    #[test]
    fn respects_max_attempts() {
        let p = policy(3);
        let boom = FailureReason::ExecutionError("boom".into());
        assert_eq!(
            p.decide(1, &boom),
            RetryDecision::RetryAfter(Duration::from_millis(5))
        );
        assert_eq!(
            p.decide(2, &boom),
            RetryDecision::RetryAfter(Duration::from_millis(5))
        );
        assert_eq!(p.decide(3, &boom), RetryDecision::GiveUp);
    }

    #[test]
    fn single_attempt_gives_up_immediately() {
        assert_eq!(
            policy(1).decide(1, &FailureReason::AbnormalExit(1)),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn every_reason_is_retryable() {
        let p = policy(2);
        for reason in [
            FailureReason::Timeout,
            FailureReason::ExecutionError("x".into()),
            FailureReason::AbnormalExit(137),
        ] {
            assert!(matches!(p.decide(1, &reason), RetryDecision::RetryAfter(_)));
        }
    }

    #[test]
    fn delay_is_constant() {
        let mut p = policy(10);
        p.delay = Duration::from_millis(250);
        let reason = FailureReason::Timeout;
        assert_eq!(p.decide(1, &reason), p.decide(8, &reason));
    }
}
