//! Quiz questions and difficulty tiers.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier of a quiz or question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A multiple-choice question. `correct_answer` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
        }
    }

    /// Checks the shape invariants: at least two options and an in-range answer index.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::validation_with_context(
                "question text is empty",
                ErrorContext::new().with_field_path("question").with_source("quiz_question"),
            ));
        }
        if self.options.len() < 2 {
            return Err(Error::validation_with_context(
                "a question needs at least two options",
                ErrorContext::new()
                    .with_field_path("options")
                    .with_details(format!("got {}", self.options.len()))
                    .with_source("quiz_question"),
            ));
        }
        if self.correct_answer >= self.options.len() {
            return Err(Error::validation_with_context(
                "correct answer index out of range",
                ErrorContext::new()
                    .with_field_path("correctAnswer")
                    .with_details(format!(
                        "index {} for {} options",
                        self.correct_answer,
                        self.options.len()
                    ))
                    .with_source("quiz_question"),
            ));
        }
        Ok(())
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }

    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn test_validate() {
        assert!(QuizQuestion::new("q?", opts(4), 3, "").validate().is_ok());
        assert!(QuizQuestion::new("q?", opts(4), 4, "").validate().is_err());
        assert!(QuizQuestion::new("q?", opts(1), 0, "").validate().is_err());
        assert!(QuizQuestion::new("  ", opts(2), 0, "").validate().is_err());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{"question":"2+2?","options":["3","4"],"correctAnswer":1}"#;
        let q: QuizQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_option(), Some("4"));
        assert!(q.is_correct(1));
        assert_eq!(q.explanation, "");
        let back = serde_json::to_value(&q).unwrap();
        assert_eq!(back["correctAnswer"], 1);
    }
}
