//! # Resilient AI Facade
//!
//! Single entry point for question generation, explanation generation and
//! skill-tree expansion.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`AiGenerator`] | Contract of the remote generative service |
//! | [`ResilientAiService`] | cache → breaker → retry → generator, with static fallback |
//! | [`ResilientAiServiceBuilder`] | Dependency-injected construction |
//! | [`MaintenanceHandle`] | Owned background cache sweep |
//!
//! ```rust,no_run
//! use skilltree_ai::facade::ResilientAiServiceBuilder;
//! use skilltree_ai::types::{Difficulty, QuestionRequest};
//! use skilltree_ai::ServiceConfig;
//!
//! # async fn demo() -> skilltree_ai::Result<()> {
//! let service = ResilientAiServiceBuilder::from_config(ServiceConfig::from_env())?.build()?;
//! let maintenance = service.start_maintenance();
//!
//! let req = QuestionRequest::new("rust", "borrowing", Difficulty::Beginner);
//! let question = service.generate_question(&req).await;
//! println!("{}", question.question);
//!
//! maintenance.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod generator;
mod maintenance;
mod service;

pub use builder::ResilientAiServiceBuilder;
pub use generator::AiGenerator;
pub use maintenance::MaintenanceHandle;
pub use service::{HealthReport, ResilientAiService};
