//! # skilltree-ai
//!
//! Resilience and adaptive-quiz core of the SkillTree learning platform.
//!
//! ## Overview
//!
//! Quiz questions, answer explanations and skill-tree expansions come from a remote
//! generative AI service. This crate puts that service behind a facade that never
//! fails: responses are cached, each operation has its own circuit breaker and retry
//! policy, and a static question bank answers whenever the service cannot. On top of
//! it sits a pure scoring engine and an async validator deciding skill mastery.
//!
//! ## Key Features
//!
//! - **Resilient facade**: [`ResilientAiService`] runs cache → breaker → retry → generator → fallback
//! - **Circuit breaking**: closed / open / half-open breakers with typed expected errors
//! - **Retry**: exponential (jittered) and linear backoff
//! - **Caching**: LRU-bounded TTL cache with an owned background sweeper
//! - **Fallback content**: built-in question bank with non-repeating per-user rotation
//! - **Adaptive quizzes**: difficulty tiers, point bonuses, hints and mastery validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skilltree_ai::{ResilientAiServiceBuilder, ServiceConfig};
//! use skilltree_ai::types::{Difficulty, QuestionRequest};
//!
//! #[tokio::main]
//! async fn main() -> skilltree_ai::Result<()> {
//!     let config = ServiceConfig::from_yaml_file("skilltree-ai.yaml")?.apply_env_overrides();
//!     let service = ResilientAiServiceBuilder::from_config(config)?.build()?;
//!     let maintenance = service.start_maintenance();
//!
//!     let req = QuestionRequest::new("rust", "lifetimes", Difficulty::Intermediate)
//!         .for_session("user-1", "session-1");
//!     let question = service.generate_question(&req).await;
//!     println!("{} {:?}", question.question, question.options);
//!
//!     maintenance.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`facade`] | Resilient AI service, generator trait, builder |
//! | [`resilience`] | Circuit breaker and retry policies |
//! | [`cache`] | Response caching with pluggable backends |
//! | [`fallback`] | Static question bank, rotation, fallback content |
//! | [`quiz`] | Difficulty, scoring, hints, sessions, validation |
//! | [`transport`] | HTTP generator |
//! | [`types`] | Questions, requests and skill-tree records |
//! | [`config`] | Service configuration (YAML + environment) |

pub mod cache;
pub mod config;
pub mod error_code;
pub mod facade;
pub mod fallback;
pub mod quiz;
pub mod resilience;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::{Operation, OperationPolicy, ServiceConfig};
pub use error_code::ServiceErrorKind;
pub use facade::{AiGenerator, HealthReport, MaintenanceHandle, ResilientAiService, ResilientAiServiceBuilder};
pub use fallback::{FallbackPool, FallbackService};
pub use quiz::{AiQuizValidator, QuizSession, QuizValidationResult};
pub use types::{Difficulty, QuizQuestion};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
