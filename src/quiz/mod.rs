//! # Adaptive Quiz Engine
//!
//! Pure scoring functions plus an async session validator.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`calculate_difficulty`] | Tier, time limit, question types and multiplier from user/skill level |
//! | [`calculate_points`] | Time, streak and difficulty bonuses |
//! | [`generate_hints`] | Explanation, eliminated option and basics hints |
//! | [`question_feedback`] | Per-answer message |
//! | [`QuizSession`] | Answer bookkeeping for one run |
//! | [`AiQuizValidator`] | Weighted mastery scoring with a simple-rule fallback |
//!
//! ```rust
//! use skilltree_ai::quiz::{calculate_difficulty, calculate_points};
//! use skilltree_ai::types::Difficulty;
//!
//! let config = calculate_difficulty(2, 5, false);
//! assert_eq!(config.difficulty, Difficulty::Intermediate);
//! assert_eq!(calculate_points(true, 30, 30, 0, Difficulty::Beginner), 15);
//! ```

pub mod difficulty;
pub mod hints;
pub mod scoring;
pub mod session;
pub mod validator;

pub use difficulty::{calculate_difficulty, tier_for_level, QuestionType, QuizConfig};
pub use hints::{generate_hints, generate_hints_with_rng, hint_count, question_feedback};
pub use scoring::{base_points, calculate_ai_enhanced_points, calculate_points};
pub use session::QuizSession;
pub use validator::{
    AiQuizValidator, AnalysisInput, HeuristicAnalyzer, LearnerProfile, MasteryLevel,
    NextRecommendations, QuizValidationResult, SessionAnalyzer, SessionScores, SessionSummary,
    SkillProfile, ValidatorConfig,
};
