//! Retryable operations with bounded attempts, backoff and cancellation.
//!
//! Used by the client session controller for profile validation and by the
//! server when establishing connections at start-up.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Delay to wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the given (1-based) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Applied to each attempt individually.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            attempt_timeout: None,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            Backoff::Exponential {
                base: Duration::from_secs(2),
                max: Duration::from_secs(30),
            },
        )
    }
}

/// Classifies an error as transient (worth another attempt) or permanent.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("operation cancelled")]
    Cancelled,

    #[error("permanent failure: {0}")]
    Permanent(E),

    /// `last` is `None` when the final attempt timed out.
    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }

    /// The error of the last completed attempt, if any.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Permanent(e) => Some(e),
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, runs out of attempts or is
/// cancelled. `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last = None;

    for attempt in 1..=max_attempts {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            outcome = run_attempt(policy.attempt_timeout, op(attempt)) => outcome,
        };

        match outcome {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) if !e.is_retryable() => {
                debug!("Attempt {} failed permanently: {}", attempt, e);
                return Err(RetryError::Permanent(e));
            }
            Some(Err(e)) => {
                warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                last = Some(e);
            }
            None => {
                warn!("Attempt {}/{} timed out", attempt, max_attempts);
                last = None;
            }
        }

        if attempt < max_attempts {
            let delay = policy.backoff.delay(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: max_attempts,
        last,
    })
}

async fn run_attempt<T, E, Fut>(timeout: Option<Duration>, fut: Fut) -> Option<Result<T, E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Backoff::Fixed(Duration::from_secs(2)))
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(2),
            max: Duration::from_secs(10),
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
        assert_eq!(backoff.delay(40), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(&policy(3), &CancellationToken::new(), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(&policy(3), &CancellationToken::new(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError::Fatal) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Permanent(TestError::Fatal))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts() {
        let result: Result<(), _> = retry(&policy(2), &CancellationToken::new(), |_| async {
            Err(TestError::Transient)
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(last, Some(TestError::Transient)));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_timeout_is_retried() {
        let policy = policy(2).with_attempt_timeout(Duration::from_secs(1));
        let result = retry(&policy, &CancellationToken::new(), |attempt| async move {
            if attempt == 1 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok::<_, TestError>(attempt)
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let result: Result<(), _> = retry(&policy(5), &cancel, |_| {
            trigger.cancel();
            async { Err(TestError::Transient) }
        })
        .await;

        assert!(result.unwrap_err().is_cancelled());
    }
}
