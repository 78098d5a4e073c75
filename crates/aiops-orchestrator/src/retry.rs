// crates/aiops-orchestrator/src/retry.rs
// ============================================================================
// Module: Retry Policy
// Description: The two fixed retry policies every workflow activity runs
//              under, plus the generic retry-with-backoff driver.
// Purpose: Give every step the same exponential-backoff, bounded-attempt
//          posture without each step reimplementing it.
// Dependencies: aiops-core (Retryability), tokio
// ============================================================================

use std::future::Future;
use std::time::Duration;

use aiops_core::Retryability;

/// A fixed retry policy: initial backoff, backoff ceiling, and maximum
/// attempts. Backoff doubles per attempt, capped at `max_backoff`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff ceiling; doubling never exceeds this.
    pub max_backoff: Duration,
    /// Maximum attempts, including the first.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// `1s` initial, `5m` ceiling, 3 attempts — used by I/O-bound steps
    /// (evidence collection, graph build, policy evaluation, execution,
    /// verification).
    pub const DEFAULT: Self = Self {
        initial_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(300),
        max_attempts: 3,
    };

    /// `1s` initial, `30s` ceiling, 3 attempts — used by short, pure
    /// operations (hypothesis generation, ranking, runbook, ticket
    /// creation).
    pub const QUICK: Self = Self {
        initial_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(30),
        max_attempts: 3,
    };

    /// A single-attempt policy with no retry at all, used for the approval
    /// step: a human response is not a transient failure to retry.
    pub const SINGLE_ATTEMPT: Self = Self {
        initial_backoff: Duration::from_secs(1),
        max_backoff: Duration::from_secs(1),
        max_attempts: 1,
    };

    fn backoff_for(self, attempt: u32) -> Duration {
        let scaled = self.initial_backoff.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        scaled.min(self.max_backoff)
    }
}

/// Runs `operation` under `policy`, retrying while the returned error is
/// [`Retryability::is_retryable`] and attempts remain. Returns the last
/// error once attempts are exhausted or the error is not retryable.
pub async fn run_with_retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryability,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !error.is_retryable() {
                    return Err(error);
                }
                tokio::time::sleep(policy.backoff_for(attempt)).await;
            }
        }
    }
}

/// The outcome of a timed, retried workflow activity: either the
/// operation's own error after retries are exhausted, or a timeout that
/// fired before it ever completed.
#[derive(Debug)]
pub enum ActivityError<E> {
    /// The operation returned this error on its last attempt.
    Operation(E),
    /// The per-activity deadline elapsed before the operation (including
    /// any retries) completed.
    TimedOut,
}

impl<E: std::fmt::Display> std::fmt::Display for ActivityError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operation(error) => write!(f, "{error}"),
            Self::TimedOut => write!(f, "activity timed out"),
        }
    }
}

/// Runs `operation` under `policy`'s retry posture, bounding the whole
/// attempt sequence (every retry included) by `timeout`. This is the unit
/// every workflow step runs through: `spec.md` §5's per-activity timeout
/// wraps the retry loop rather than each individual attempt.
pub async fn run_activity<T, E, F, Fut>(
    timeout: Duration,
    policy: RetryPolicy,
    operation: F,
) -> Result<T, ActivityError<E>>
where
    E: Retryability,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, run_with_retry(policy, operation)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ActivityError::Operation(error)),
        Err(_elapsed) => Err(ActivityError::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    #[derive(Debug)]
    struct AlwaysRetryable;

    impl Retryability for AlwaysRetryable {
        fn is_retryable(&self) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct NeverRetryable;

    impl Retryability for NeverRetryable {
        fn is_retryable(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn retries_up_to_max_attempts_then_gives_up() {
        let calls = AtomicU32::new(0);
        let policy =
            RetryPolicy { initial_backoff: Duration::from_millis(1), max_backoff: Duration::from_millis(1), max_attempts: 3 };
        let result: Result<(), AlwaysRetryable> = run_with_retry(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AlwaysRetryable) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), NeverRetryable> = run_with_retry(RetryPolicy::DEFAULT, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(NeverRetryable) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let result: Result<u32, AlwaysRetryable> = run_with_retry(RetryPolicy::QUICK, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn run_activity_wraps_operation_error() {
        let result: Result<(), ActivityError<NeverRetryable>> =
            run_activity(Duration::from_secs(5), RetryPolicy::SINGLE_ATTEMPT, || async { Err(NeverRetryable) }).await;
        assert!(matches!(result, Err(ActivityError::Operation(NeverRetryable))));
    }

    #[tokio::test]
    async fn run_activity_times_out_when_operation_never_resolves_in_time() {
        let result: Result<(), ActivityError<NeverRetryable>> =
            run_activity(Duration::from_millis(10), RetryPolicy::SINGLE_ATTEMPT, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ActivityError::TimedOut)));
    }
}
