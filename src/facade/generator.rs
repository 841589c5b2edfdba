use crate::types::{
    ExplanationRequest, QuestionRequest, QuizQuestion, SkillTreeExpansion, SkillTreeRequest,
};
use crate::Result;
use async_trait::async_trait;

/// The generative-AI service behind the facade.
///
/// Implementations report failures as [`crate::Error`] values tagged with a
/// [`ServiceErrorKind`](crate::error_code::ServiceErrorKind); the facade's breakers
/// use that kind to tell expected errors from counted ones.
#[async_trait]
pub trait AiGenerator: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    async fn generate_question(&self, req: &QuestionRequest) -> Result<QuizQuestion>;

    async fn generate_explanation(&self, req: &ExplanationRequest) -> Result<String>;

    async fn expand_skill_tree(&self, req: &SkillTreeRequest) -> Result<SkillTreeExpansion>;
}
