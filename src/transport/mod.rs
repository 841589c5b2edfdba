//! Network transport for the AI generator.

pub mod http;

pub use http::{HttpAiGenerator, HttpConfig, TransportError, DEFAULT_API_KEY_ENV};
