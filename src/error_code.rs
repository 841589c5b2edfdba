//! Service error kinds: tagged classification of AI-service failures.
//!
//! Every failure that crosses the AI boundary is tagged with a [`ServiceErrorKind`]
//! by the layer that observed it (HTTP transport, breaker timeout, generator
//! implementation). Circuit breakers decide whether a failure counts toward their
//! threshold by comparing kinds, never by inspecting message text.
//!
//! | Prefix | Category    | Description                          |
//! |--------|-------------|--------------------------------------|
//! | E1xxx  | client      | Request-side errors                  |
//! | E2xxx  | rate        | Rate limit and quota errors          |
//! | E3xxx  | server      | Provider-side errors and timeouts    |
//! | E4xxx  | local       | Errors raised by this crate          |
//! | E9xxx  | unknown     | Catch-all / unclassified             |
//!
//! ## Example
//!
//! ```rust
//! use skilltree_ai::error_code::ServiceErrorKind;
//!
//! let kind = ServiceErrorKind::from_status(429);
//! assert_eq!(kind, ServiceErrorKind::RateLimited);
//! assert!(kind.retryable());
//! assert_eq!(kind.code(), "E2001");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failed call to the AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    /// E1001: Malformed request or missing required fields
    InvalidRequest,
    /// E1002: Invalid, expired, or missing API key
    Authentication,
    /// E1003: Requested model or endpoint does not exist
    NotFound,
    /// E2001: Request rate limit exceeded
    RateLimited,
    /// E2002: Account usage quota reached
    QuotaExhausted,
    /// E3001: Internal server error on provider side
    ServerError,
    /// E3002: Provider temporarily overloaded
    Overloaded,
    /// E3003: Call did not complete within its time budget
    Timeout,
    /// E4001: Response could not be decoded or violated a data invariant
    InvalidResponse,
    /// E4002: Service short-circuited locally (open breaker, no transport)
    Unavailable,
    /// E9999: Error could not be classified
    Unknown,
}

impl ServiceErrorKind {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "E1001",
            Self::Authentication => "E1002",
            Self::NotFound => "E1003",
            Self::RateLimited => "E2001",
            Self::QuotaExhausted => "E2002",
            Self::ServerError => "E3001",
            Self::Overloaded => "E3002",
            Self::Timeout => "E3003",
            Self::InvalidResponse => "E4001",
            Self::Unavailable => "E4002",
            Self::Unknown => "E9999",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::InvalidResponse => "invalid_response",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a fresh attempt has a reasonable chance of succeeding.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::ServerError
                | Self::Overloaded
                | Self::Timeout
                | Self::Unknown
        )
    }

    /// Returns `"client"`, `"rate"`, `"server"`, `"local"`, or `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest | Self::Authentication | Self::NotFound => "client",
            Self::RateLimited | Self::QuotaExhausted => "rate",
            Self::ServerError | Self::Overloaded | Self::Timeout => "server",
            Self::InvalidResponse | Self::Unavailable => "local",
            Self::Unknown => "unknown",
        }
    }

    /// Maps an HTTP status code returned by the AI service.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest,
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            402 => Self::QuotaExhausted,
            503 | 529 => Self::Overloaded,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Maps a provider error code/type string (as found in a JSON error body).
    ///
    /// Accepts the standard names plus common provider aliases such as
    /// `"rate_limit_exceeded"`, `"insufficient_quota"` or `"overloaded_error"`.
    pub fn from_provider_code(provider_code: &str) -> Option<Self> {
        let kind = match provider_code {
            "invalid_request" | "invalid_request_error" => Self::InvalidRequest,
            "authentication" | "invalid_api_key" | "authentication_error" => Self::Authentication,
            "not_found" | "model_not_found" => Self::NotFound,
            "rate_limited" | "rate_limit" | "rate_limit_exceeded" => Self::RateLimited,
            "quota_exhausted" | "insufficient_quota" | "resource_exhausted" => {
                Self::QuotaExhausted
            }
            "server_error" | "internal" => Self::ServerError,
            "overloaded" | "overloaded_error" | "unavailable" => Self::Overloaded,
            "timeout" | "deadline_exceeded" => Self::Timeout,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceErrorKind::from_status(429), ServiceErrorKind::RateLimited);
        assert_eq!(ServiceErrorKind::from_status(401), ServiceErrorKind::Authentication);
        assert_eq!(ServiceErrorKind::from_status(503), ServiceErrorKind::Overloaded);
        assert_eq!(ServiceErrorKind::from_status(502), ServiceErrorKind::ServerError);
        assert_eq!(ServiceErrorKind::from_status(504), ServiceErrorKind::Timeout);
        assert_eq!(ServiceErrorKind::from_status(302), ServiceErrorKind::Unknown);
    }

    #[test]
    fn test_provider_aliases() {
        assert_eq!(
            ServiceErrorKind::from_provider_code("rate_limit_exceeded"),
            Some(ServiceErrorKind::RateLimited)
        );
        assert_eq!(
            ServiceErrorKind::from_provider_code("insufficient_quota"),
            Some(ServiceErrorKind::QuotaExhausted)
        );
        assert_eq!(ServiceErrorKind::from_provider_code("something_else"), None);
    }

    #[test]
    fn test_retryable_and_category() {
        assert!(ServiceErrorKind::Timeout.retryable());
        assert!(!ServiceErrorKind::InvalidRequest.retryable());
        assert!(!ServiceErrorKind::Authentication.retryable());
        assert_eq!(ServiceErrorKind::QuotaExhausted.category(), "rate");
        assert_eq!(ServiceErrorKind::Unavailable.category(), "local");
        assert_eq!(ServiceErrorKind::Overloaded.to_string(), "overloaded");
    }
}
