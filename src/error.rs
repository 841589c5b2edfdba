use crate::error_code::ServiceErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "question.breaker.failure_threshold")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "circuit_breaker", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the resilience and quiz core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("AI service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    #[error("Circuit breaker '{name}' is open (retry in {retry_in_ms} ms)")]
    CircuitOpen { name: String, retry_in_ms: u64 },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a service error tagged with its kind.
    pub fn service(kind: ServiceErrorKind, msg: impl Into<String>) -> Self {
        Error::Service {
            kind,
            message: msg.into(),
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Classify this error for breaker accounting and retry decisions.
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Error::Service { kind, .. } => *kind,
            Error::CircuitOpen { .. } => ServiceErrorKind::Unavailable,
            Error::Transport(t) => t.kind(),
            Error::Serialization(_) | Error::Validation { .. } => {
                ServiceErrorKind::InvalidResponse
            }
            Error::Configuration { .. } => ServiceErrorKind::InvalidRequest,
            Error::Io(_) | Error::Yaml(_) => ServiceErrorKind::Unknown,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
