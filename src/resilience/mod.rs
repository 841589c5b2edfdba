//! # Resilience Primitives Module
//!
//! Guards around calls to the generative-AI service so that a slow or failing
//! provider degrades quiz flows instead of breaking them.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`circuit_breaker`] | Closed / open / half-open breaker with optional fallback |
//! | [`retry`] | Exponential and linear backoff helpers |
//!
//! ## Circuit Breaker
//!
//! - **Closed**: Normal operation, requests pass through
//! - **Open**: Failures exceeded threshold, requests fail fast or use the fallback
//! - **Half-Open**: The next request probes whether the service recovered
//!
//! ```rust
//! use skilltree_ai::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use skilltree_ai::resilience::retry::with_exponential_backoff;
//! use std::time::Duration;
//!
//! # async fn demo() -> skilltree_ai::Result<String> {
//! let breaker = CircuitBreaker::new(
//!     "questions",
//!     CircuitBreakerConfig::new()
//!         .with_failure_threshold(3)
//!         .with_reset_timeout(Duration::from_secs(30)),
//! );
//!
//! breaker
//!     .execute_with_fallback(
//!         || with_exponential_backoff(
//!             || async { Ok("generated".to_string()) },
//!             2,
//!             Duration::from_millis(500),
//!             Duration::from_secs(5),
//!         ),
//!         || async { Ok("static".to_string()) },
//!     )
//!     .await
//! # }
//! ```

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use retry::{with_exponential_backoff, with_linear_backoff, Backoff, RetryConfig};
