//! Request records for the three AI-backed operations.
//!
//! Each request names the fields that determine its answer via `cache_fields`;
//! per-user routing fields (user and session ids) are deliberately left out so
//! learners studying the same topic share cached generations.

use super::question::Difficulty;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    /// Skill the question belongs to; also selects the fallback pool.
    pub competence_id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl QuestionRequest {
    pub fn new(competence_id: impl Into<String>, topic: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            competence_id: competence_id.into(),
            topic: topic.into(),
            difficulty,
            language: None,
            user_id: None,
            session_id: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach the learner so fallback questions rotate without repeats.
    pub fn for_session(mut self, user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.session_id = Some(session_id.into());
        self
    }

    pub fn cache_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("competenceId", self.competence_id.clone()),
            ("topic", self.topic.clone()),
            ("difficulty", self.difficulty.to_string()),
            ("language", self.language.clone().unwrap_or_default()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationRequest {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ExplanationRequest {
    pub fn new(
        question: impl Into<String>,
        user_answer: impl Into<String>,
        correct_answer: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            user_answer: user_answer.into(),
            correct_answer: correct_answer.into(),
            topic: topic.into(),
            language: None,
        }
    }

    pub fn cache_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("question", self.question.clone()),
            ("userAnswer", self.user_answer.clone()),
            ("correctAnswer", self.correct_answer.clone()),
            ("topic", self.topic.clone()),
            ("language", self.language.clone().unwrap_or_default()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTreeRequest {
    pub skill_id: String,
    pub skill_name: String,
    /// Level of the skill being expanded; generated children sit one level deeper.
    pub level: u32,
    #[serde(default)]
    pub existing_skills: Vec<String>,
}

impl SkillTreeRequest {
    pub fn new(skill_id: impl Into<String>, skill_name: impl Into<String>, level: u32) -> Self {
        Self {
            skill_id: skill_id.into(),
            skill_name: skill_name.into(),
            level,
            existing_skills: Vec::new(),
        }
    }

    pub fn with_existing(mut self, skills: Vec<String>) -> Self {
        self.existing_skills = skills;
        self
    }

    pub fn cache_fields(&self) -> Vec<(&'static str, String)> {
        let mut existing = self.existing_skills.clone();
        existing.sort();
        vec![
            ("skillId", self.skill_id.clone()),
            ("skillName", self.skill_name.clone()),
            ("level", self.level.to_string()),
            ("existingSkills", existing.join(",")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_cache_fields_ignore_session() {
        let a = QuestionRequest::new("rust", "ownership", Difficulty::Beginner);
        let b = a.clone().for_session("u1", "s1");
        assert_eq!(a.cache_fields(), b.cache_fields());
    }

    #[test]
    fn test_skill_tree_cache_fields_sorted() {
        let a = SkillTreeRequest::new("web", "Web", 1).with_existing(vec!["b".into(), "a".into()]);
        let b = SkillTreeRequest::new("web", "Web", 1).with_existing(vec!["a".into(), "b".into()]);
        assert_eq!(a.cache_fields(), b.cache_fields());
    }
}
