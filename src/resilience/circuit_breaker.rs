use crate::error_code::ServiceErrorKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("CLOSED"),
            Self::Open => f.write_str("OPEN"),
            Self::HalfOpen => f.write_str("HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    /// How long the circuit stays open before a half-open probe is allowed.
    #[serde(rename = "reset_timeout_ms", with = "crate::config::duration_ms")]
    pub reset_timeout: Duration,
    /// Failures older than this are forgotten.
    #[serde(rename = "monitoring_window_ms", with = "crate::config::duration_ms")]
    pub monitoring_window: Duration,
    /// Budget for a single protected call; exceeding it counts as a `Timeout` failure.
    #[serde(rename = "call_timeout_ms", with = "crate::config::duration_ms")]
    pub call_timeout: Duration,
    /// Error kinds that trigger fallback but never count toward the threshold.
    pub expected_errors: Vec<ServiceErrorKind>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
            monitoring_window: Duration::from_secs(120),
            call_timeout: Duration::from_secs(10),
            expected_errors: vec![ServiceErrorKind::RateLimited],
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    pub fn with_monitoring_window(mut self, window: Duration) -> Self {
        self.monitoring_window = window;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_expected_errors(mut self, kinds: Vec<ServiceErrorKind>) -> Self {
        self.expected_errors = kinds;
        self
    }

    fn is_expected(&self, err: &Error) -> bool {
        self.expected_errors.contains(&err.kind())
    }
}

/// Read-only view of a breaker's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u64,
    /// Epoch milliseconds of the most recent counted failure.
    pub last_failure_time: Option<u64>,
    /// Epoch milliseconds of the most recent success.
    pub last_success_time: Option<u64>,
    pub total_requests: u64,
    pub uptime_percent: f64,
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    failure_count: u32,
    success_count: u64,
    total_requests: u64,
    last_failure_at: Option<Instant>,
    last_failure_time: Option<u64>,
    last_success_time: Option<u64>,
    next_attempt: Option<Instant>,
}

impl State {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            total_requests: 0,
            last_failure_at: None,
            last_failure_time: None,
            last_success_time: None,
            next_attempt: None,
        }
    }
}

enum Admission {
    Proceed,
    Reject { retry_in: Duration },
}

/// Circuit breaker guarding a single kind of outbound call.
///
/// - `Closed`: calls pass through; counted failures inside the monitoring window
///   accumulate until `failure_threshold` trips the circuit
/// - `Open`: calls are rejected (or served by the fallback) until `reset_timeout` elapses
/// - `HalfOpen`: the next call is a probe; success closes, failure reopens
///
/// State lives in a std mutex that is never held across an `.await`.
pub struct CircuitBreaker {
    name: String,
    cfg: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            cfg,
            state: Mutex::new(State::closed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Counters stay meaningful even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `operation` under breaker protection. Fails with [`Error::CircuitOpen`]
    /// while the circuit is open and not yet eligible for a probe.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.admit() {
            Admission::Reject { retry_in } => Err(Error::CircuitOpen {
                name: self.name.clone(),
                retry_in_ms: retry_in.as_millis() as u64,
            }),
            Admission::Proceed => self.call(operation).await,
        }
    }

    /// Like [`execute`](Self::execute), but any failure or rejection is answered by
    /// `fallback` instead of being returned.
    pub async fn execute_with_fallback<T, F, Fut, FB, FbFut>(
        &self,
        operation: F,
        fallback: FB,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        FB: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T>>,
    {
        match self.admit() {
            Admission::Reject { retry_in } => {
                debug!(
                    breaker = %self.name,
                    retry_in_ms = retry_in.as_millis() as u64,
                    "circuit open, serving fallback"
                );
                fallback().await
            }
            Admission::Proceed => match self.call(operation).await {
                Ok(value) => Ok(value),
                Err(err) => {
                    warn!(breaker = %self.name, error = %err, "operation failed, serving fallback");
                    fallback().await
                }
            },
        }
    }

    fn admit(&self) -> Admission {
        let mut st = self.lock();
        st.total_requests = st.total_requests.saturating_add(1);
        let now = Instant::now();

        if st.state == CircuitState::Closed && self.threshold_breached(&st, now) {
            self.trip(&mut st, now);
        }

        if st.state == CircuitState::Open {
            match st.next_attempt {
                Some(at) if now < at => return Admission::Reject { retry_in: at - now },
                _ => {
                    st.state = CircuitState::HalfOpen;
                    info!(breaker = %self.name, "circuit half-open, probing");
                }
            }
        }
        Admission::Proceed
    }

    async fn call<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = match tokio::time::timeout(self.cfg.call_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(Error::service(
                ServiceErrorKind::Timeout,
                format!(
                    "operation timed out after {} ms",
                    self.cfg.call_timeout.as_millis()
                ),
            )),
        };
        match &result {
            Ok(_) => self.on_success(),
            Err(err) => self.on_failure(err),
        }
        result
    }

    fn threshold_breached(&self, st: &State, now: Instant) -> bool {
        let recent = st
            .last_failure_at
            .map(|at| now.duration_since(at) <= self.cfg.monitoring_window)
            .unwrap_or(false);
        recent
            && st.failure_count >= self.cfg.failure_threshold
            && st.total_requests >= u64::from(self.cfg.failure_threshold)
    }

    fn trip(&self, st: &mut State, now: Instant) {
        st.state = CircuitState::Open;
        st.next_attempt = Some(now + self.cfg.reset_timeout);
        warn!(
            breaker = %self.name,
            failures = st.failure_count,
            reset_timeout_ms = self.cfg.reset_timeout.as_millis() as u64,
            "circuit opened"
        );
    }

    fn on_success(&self) {
        let mut st = self.lock();
        st.success_count = st.success_count.saturating_add(1);
        st.last_success_time = Some(epoch_ms());
        if st.state == CircuitState::HalfOpen {
            st.state = CircuitState::Closed;
            st.failure_count = 0;
            st.next_attempt = None;
            info!(breaker = %self.name, "probe succeeded, circuit closed");
        }
    }

    fn on_failure(&self, err: &Error) {
        let mut st = self.lock();
        let now = Instant::now();
        if self.cfg.is_expected(err) {
            debug!(breaker = %self.name, kind = %err.kind(), "expected error, not counted");
            // an uncounted probe result still ends the half-open phase
            if st.state == CircuitState::HalfOpen {
                self.trip(&mut st, now);
            }
            return;
        }
        let stale = st
            .last_failure_at
            .map(|at| now.duration_since(at) > self.cfg.monitoring_window)
            .unwrap_or(false);
        if stale && st.state == CircuitState::Closed {
            st.failure_count = 0;
        }
        st.failure_count = st.failure_count.saturating_add(1);
        st.last_failure_at = Some(now);
        st.last_failure_time = Some(epoch_ms());

        match st.state {
            CircuitState::HalfOpen => self.trip(&mut st, now),
            CircuitState::Closed if self.threshold_breached(&st, now) => self.trip(&mut st, now),
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let st = self.lock();
        let uptime_percent = if st.total_requests == 0 {
            100.0
        } else {
            (st.success_count as f64 / st.total_requests as f64 * 100.0).min(100.0)
        };
        CircuitBreakerStats {
            name: self.name.clone(),
            state: st.state,
            failure_count: st.failure_count,
            success_count: st.success_count,
            last_failure_time: st.last_failure_time,
            last_success_time: st.last_success_time,
            total_requests: st.total_requests,
            uptime_percent,
        }
    }

    /// Open the circuit manually for one `reset_timeout`.
    pub fn force_open(&self) {
        let mut st = self.lock();
        let now = Instant::now();
        self.trip(&mut st, now);
    }

    /// Close the circuit manually and forget counted failures.
    pub fn force_close(&self) {
        let mut st = self.lock();
        st.state = CircuitState::Closed;
        st.failure_count = 0;
        st.next_attempt = None;
        info!(breaker = %self.name, "circuit force-closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker(threshold: u32, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_reset_timeout(Duration::from_millis(reset_ms))
                .with_monitoring_window(Duration::from_secs(60))
                .with_call_timeout(Duration::from_secs(1)),
        )
    }

    async fn fail(cb: &CircuitBreaker) -> Result<u32> {
        cb.execute(|| async {
            Err::<u32, _>(Error::service(ServiceErrorKind::ServerError, "boom"))
        })
        .await
    }

    #[test]
    fn test_config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.call_timeout, Duration::from_secs(10));
        assert_eq!(config.expected_errors, vec![ServiceErrorKind::RateLimited]);
    }

    #[tokio::test]
    async fn test_initial_stats() {
        let cb = breaker(3, 1000);
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.uptime_percent, 100.0);

        let v = cb.execute(|| async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(v, 7);
        let stats = cb.stats();
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.total_requests, 1);
        assert!(stats.last_success_time.is_some());
    }

    #[tokio::test]
    async fn test_opens_at_threshold_and_short_circuits() {
        let cb = breaker(3, 10_000);
        for _ in 0..3 {
            assert!(fail(&cb).await.is_err());
        }
        assert_eq!(cb.state(), CircuitState::Open);

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = cb
            .execute(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CircuitOpen { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let v = cb
            .execute_with_fallback(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Error>(1)
                },
                || async { Ok(99) },
            )
            .await
            .unwrap();
        assert_eq!(v, 99);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expected_errors_not_counted() {
        let cb = breaker(2, 10_000);
        for _ in 0..5 {
            let v = cb
                .execute_with_fallback(
                    || async {
                        Err::<u32, _>(Error::service(
                            ServiceErrorKind::RateLimited,
                            "rate_limit exceeded",
                        ))
                    },
                    || async { Ok(42) },
                )
                .await
                .unwrap();
            assert_eq!(v, 42);
        }
        let stats = cb.stats();
        assert_eq!(stats.failure_count, 0);
        assert_eq!(stats.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_half_open_probe_success_closes() {
        let cb = breaker(2, 30);
        fail(&cb).await.ok();
        fail(&cb).await.ok();
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let v = cb.execute(|| async { Ok::<_, Error>(5) }).await.unwrap();
        assert_eq!(v, 5);
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.failure_count, 0);
    }

    #[tokio::test]
    async fn test_half_open_probe_failure_reopens() {
        let cb = breaker(2, 30);
        fail(&cb).await.ok();
        fail(&cb).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = fail(&cb).await.unwrap_err();
        assert!(matches!(err, Error::Service { .. }));
        assert_eq!(cb.state(), CircuitState::Open);

        // Fresh cooldown: the very next call is rejected again.
        let err = cb.execute(|| async { Ok::<_, Error>(1) }).await.unwrap_err();
        assert!(matches!(err, Error::CircuitOpen { .. }));
    }

    #[tokio::test]
    async fn test_expected_error_during_probe_reopens_without_counting() {
        let cb = breaker(2, 30);
        fail(&cb).await.ok();
        fail(&cb).await.ok();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = cb
            .execute(|| async {
                Err::<u32, _>(Error::service(ServiceErrorKind::RateLimited, "slow down"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ServiceErrorKind::RateLimited);
        let stats = cb.stats();
        assert_eq!(stats.state, CircuitState::Open);
        assert_eq!(stats.failure_count, 2);

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = cb
            .execute(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CircuitOpen { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let cb = CircuitBreaker::new(
            "slow",
            CircuitBreakerConfig::new()
                .with_failure_threshold(1)
                .with_call_timeout(Duration::from_millis(20)),
        );
        let err = cb
            .execute(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, Error>(1)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ServiceErrorKind::Timeout);
        assert_eq!(cb.stats().failure_count, 1);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_failures_outside_window_are_forgotten() {
        let cb = CircuitBreaker::new(
            "window",
            CircuitBreakerConfig::new()
                .with_failure_threshold(2)
                .with_monitoring_window(Duration::from_millis(20)),
        );
        fail(&cb).await.ok();
        tokio::time::sleep(Duration::from_millis(40)).await;
        fail(&cb).await.ok();
        assert_eq!(cb.stats().failure_count, 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_force_open_and_close() {
        let cb = breaker(5, 10_000);
        cb.force_open();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.execute(|| async { Ok::<_, Error>(1) }).await.is_err());

        cb.force_close();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.execute(|| async { Ok::<_, Error>(1) }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fallback_used_on_failure_while_closed() {
        let cb = breaker(5, 10_000);
        let v = cb
            .execute_with_fallback(
                || async { Err::<u32, _>(Error::service(ServiceErrorKind::ServerError, "x")) },
                || async { Ok(3) },
            )
            .await
            .unwrap();
        assert_eq!(v, 3);
        assert_eq!(cb.stats().failure_count, 1);
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
