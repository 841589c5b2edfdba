//! # Types Module
//!
//! Records exchanged with the AI service and with quiz callers. All of them are
//! JSON-serializable with camelCase field names, matching the generator's wire contract.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QuizQuestion`] | Multiple-choice question with answer index and explanation |
//! | [`Difficulty`] | beginner / intermediate / advanced |
//! | [`QuestionRequest`] | Input of question generation |
//! | [`ExplanationRequest`] | Input of explanation generation |
//! | [`SkillTreeRequest`] | Input of skill-tree expansion |
//! | [`SkillTreeExpansion`] | Output of skill-tree expansion |

pub mod question;
pub mod request;
pub mod skill;

pub use question::{Difficulty, QuizQuestion};
pub use request::{ExplanationRequest, QuestionRequest, SkillTreeRequest};
pub use skill::{NewSkill, SkillTreeExpansion};
