//! Retry helpers with exponential or linear backoff.
//!
//! Retrying is independent of circuit state: callers compose the two by running
//! the retry loop *inside* the operation a breaker protects.

use crate::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base * 2^attempt` plus up to 10% jitter, capped at `max_delay`.
    Exponential,
    /// `base * (attempt + 1)`.
    Linear,
}

/// Configuration for retry logic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    #[serde(rename = "base_delay_ms", with = "crate::config::duration_ms")]
    pub base_delay: Duration,
    #[serde(rename = "max_delay_ms", with = "crate::config::duration_ms")]
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to sleep after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential => exponential_delay(attempt, self.base_delay, self.max_delay),
            Backoff::Linear => linear_delay(attempt, self.base_delay),
        }
    }

    /// Run `operation` with this policy.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry_loop(operation, self.max_retries, |attempt| self.delay_for(attempt)).await
    }
}

fn exponential_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let exp_ms = (base.as_millis() as u64).saturating_mul(u64::from(factor));
    let jitter_ms = (exp_ms as f64 * rand::thread_rng().gen_range(0.0..=0.1)) as u64;
    Duration::from_millis(exp_ms.saturating_add(jitter_ms)).min(max)
}

fn linear_delay(attempt: u32, delay: Duration) -> Duration {
    delay.saturating_mul(attempt.saturating_add(1))
}

async fn retry_loop<T, F, Fut, D>(mut operation: F, max_retries: u32, delay_for: D) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(u32) -> Duration,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_retries => return Err(err),
            Err(err) => {
                let delay = delay_for(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Attempts `operation` up to `max_retries + 1` times, sleeping
/// `min(base_delay * 2^attempt + jitter, max_delay)` between attempts.
/// The last error is returned once attempts are exhausted.
pub async fn with_exponential_backoff<T, F, Fut>(
    operation: F,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_loop(operation, max_retries, |attempt| {
        exponential_delay(attempt, base_delay, max_delay)
    })
    .await
}

/// Attempts `operation` up to `max_retries + 1` times, sleeping `delay * (attempt + 1)`
/// between attempts.
pub async fn with_linear_backoff<T, F, Fut>(
    operation: F,
    max_retries: u32,
    delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_loop(operation, max_retries, |attempt| linear_delay(attempt, delay)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_code::ServiceErrorKind;
    use crate::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delay_bounds() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(10);
        for attempt in 0..4 {
            let d = exponential_delay(attempt, base, max).as_millis() as u64;
            let exp = 100u64 << attempt;
            assert!(d >= exp, "attempt {attempt}: {d} < {exp}");
            assert!(d <= exp + exp / 10, "attempt {attempt}: {d} exceeds jitter");
        }
    }

    #[test]
    fn test_exponential_delay_capped() {
        let d = exponential_delay(20, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(d, Duration::from_millis(500));
    }

    #[test]
    fn test_linear_delay() {
        let cfg = RetryConfig::new()
            .with_backoff(Backoff::Linear)
            .with_base_delay(Duration::from_millis(50));
        assert_eq!(cfg.delay_for(0), Duration::from_millis(50));
        assert_eq!(cfg.delay_for(2), Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let v = with_exponential_backoff(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::service(ServiceErrorKind::ServerError, "flaky"))
                } else {
                    Ok(n)
                }
            },
            3,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert_eq!(v, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = with_linear_backoff(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::service(ServiceErrorKind::ServerError, format!("fail {n}")))
            },
            2,
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("fail 2"));
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let cfg = RetryConfig::new().with_max_retries(0);
        let result = cfg
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::service(ServiceErrorKind::Timeout, "slow"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
