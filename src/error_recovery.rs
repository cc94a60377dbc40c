// src/error_recovery.rs
//! Bounded retry with linear or exponential backoff.
//!
//! [`retry_with_backoff`] is the mechanical loop: it knows nothing about
//! what failed. Callers that want classification-aware retry pass their
//! own decision to [`retry_with_decision`], usually built from
//! [`classifier::ErrorKind`].

pub mod classifier;

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

pub use classifier::{classify, classify_message, ErrorKind};

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * (attempt + 1)`
    Linear,
    /// `base * 2^attempt`
    Exponential,
}

impl Backoff {
    /// Delay to wait after the zero-based `attempt` failed.
    pub fn delay(&self, base: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Linear => base.saturating_mul(attempt.saturating_add(1)),
            Backoff::Exponential => base.saturating_mul(2u32.saturating_pow(attempt)),
        }
    }
}

/// Retry bounds for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn linear(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Linear,
        }
    }

    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Exponential,
        }
    }

    /// Total invocations the policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay(self.base_delay, attempt)
    }
}

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the policy's backoff plus `extra_delay`.
    Retry { extra_delay: Duration },
    /// Give up and surface the error as-is.
    Stop,
}

impl RetryDecision {
    pub const RETRY: RetryDecision = RetryDecision::Retry {
        extra_delay: Duration::ZERO,
    };
}

/// Retries `operation` under `policy`, retrying every failure.
///
/// `on_retry(attempt_number, &error)` runs after the backoff sleep and
/// before the next attempt. Exhaustion surfaces as
/// [`AppError::MaxRetriesExceeded`] wrapping the last cause.
pub async fn retry_with_backoff<F, Fut, T, R>(
    operation_name: &str,
    policy: &RetryPolicy,
    operation: F,
    on_retry: R,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    R: FnMut(u32, &AppError),
{
    retry_with_decision(
        operation_name,
        policy,
        operation,
        |_| RetryDecision::RETRY,
        on_retry,
    )
    .await
}

/// Retry loop with a per-failure decision.
///
/// A [`RetryDecision::Stop`] returns the failing error unwrapped; only
/// running out of attempts produces `MaxRetriesExceeded`.
pub async fn retry_with_decision<F, Fut, T, D, R>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
    mut decide: D,
    mut on_retry: R,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    D: FnMut(&AppError) -> RetryDecision,
    R: FnMut(u32, &AppError),
{
    let mut attempt: u32 = 0;
    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let extra_delay = match decide(&error) {
            RetryDecision::Stop => return Err(error),
            RetryDecision::Retry { extra_delay } => extra_delay,
        };

        if attempt >= policy.max_retries {
            log::debug!(
                "{} exhausted {} attempts",
                operation_name,
                policy.max_attempts()
            );
            return Err(error.exhausted(operation_name, policy.max_attempts()));
        }

        let delay = extra_delay.saturating_add(policy.delay_for(attempt));
        log::warn!(
            "{} failed, retry {}/{} in {:?}: {}",
            operation_name,
            attempt + 1,
            policy.max_retries,
            delay,
            error
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        on_retry(attempt + 1, &error);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing(calls: &AtomicU32) -> impl Future<Output = Result<(), AppError>> + '_ {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::MalformedResponse("boom".into()))
        }
    }

    #[test]
    fn backoff_schedules() {
        let base = Duration::from_millis(100);
        let linear: Vec<_> = (0..3).map(|a| Backoff::Linear.delay(base, a)).collect();
        let exponential: Vec<_> = (0..4).map(|a| Backoff::Exponential.delay(base, a)).collect();
        assert_eq!(linear, [100, 200, 300].map(Duration::from_millis));
        assert_eq!(exponential, [100, 200, 400, 800].map(Duration::from_millis));
    }

    #[tokio::test]
    async fn permanent_failure_invokes_n_plus_one_times() {
        for max_retries in 0..4 {
            let calls = AtomicU32::new(0);
            let mut retries = Vec::new();
            let policy = RetryPolicy::linear(max_retries, Duration::ZERO);

            let err = retry_with_backoff("Fetch thing", &policy, || failing(&calls), |n, _| {
                retries.push(n)
            })
            .await
            .unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
            assert_eq!(retries, (1..=max_retries).collect::<Vec<_>>());
            assert_eq!(err.code(), ErrorCode::MaxRetriesExceeded);
            match err {
                AppError::MaxRetriesExceeded {
                    operation, source, ..
                } => {
                    assert_eq!(operation, "Fetch thing");
                    assert_eq!(source.code(), ErrorCode::MalformedResponse);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::exponential(3, Duration::from_millis(1));
        let value = retry_with_backoff(
            "flaky",
            &policy,
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::MalformedResponse("not yet".into()))
                } else {
                    Ok(42)
                }
            },
            |_, _| {},
        )
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_decision_surfaces_original_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::linear(5, Duration::ZERO);
        let err = retry_with_decision(
            "lookup",
            &policy,
            || failing(&calls),
            |_| RetryDecision::Stop,
            |_, _| {},
        )
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.code(), ErrorCode::MalformedResponse);
    }
}
