//! Difficulty tiers and the per-session quiz configuration they imply.

use crate::types::Difficulty;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillInTheBlank,
    CodeCompletion,
    Scenario,
}

/// Settings fixed for the whole session once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub difficulty: Difficulty,
    pub question_types: Vec<QuestionType>,
    pub time_limit_seconds: u32,
    pub points_multiplier: f64,
    pub ai_validation: bool,
    pub adaptive_mode: bool,
}

/// Tier for a combined level: up to 3 is beginner, up to 7 intermediate, above that advanced.
pub fn tier_for_level(level: u32) -> Difficulty {
    match level {
        0..=3 => Difficulty::Beginner,
        4..=7 => Difficulty::Intermediate,
        _ => Difficulty::Advanced,
    }
}

/// Derive the session configuration from the higher of the two levels.
///
/// AI mode grants 15 extra seconds per question and turns on AI validation
/// and adaptive difficulty.
pub fn calculate_difficulty(user_level: u32, skill_level: u32, ai_mode: bool) -> QuizConfig {
    let difficulty = tier_for_level(user_level.max(skill_level));
    let (time_limit, question_types, points_multiplier) = match difficulty {
        Difficulty::Beginner => (
            30,
            vec![QuestionType::MultipleChoice, QuestionType::TrueFalse],
            1.0,
        ),
        Difficulty::Intermediate => (
            25,
            vec![
                QuestionType::MultipleChoice,
                QuestionType::TrueFalse,
                QuestionType::FillInTheBlank,
            ],
            1.5,
        ),
        Difficulty::Advanced => (
            20,
            vec![
                QuestionType::MultipleChoice,
                QuestionType::FillInTheBlank,
                QuestionType::CodeCompletion,
                QuestionType::Scenario,
            ],
            2.0,
        ),
    };
    QuizConfig {
        difficulty,
        question_types,
        time_limit_seconds: if ai_mode { time_limit + 15 } else { time_limit },
        points_multiplier,
        ai_validation: ai_mode,
        adaptive_mode: ai_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(calculate_difficulty(1, 1, false).difficulty, Difficulty::Beginner);
        assert_eq!(calculate_difficulty(3, 0, false).difficulty, Difficulty::Beginner);
        assert_eq!(calculate_difficulty(0, 4, false).difficulty, Difficulty::Intermediate);
        assert_eq!(calculate_difficulty(7, 2, false).difficulty, Difficulty::Intermediate);
        assert_eq!(calculate_difficulty(8, 0, false).difficulty, Difficulty::Advanced);
        assert_eq!(calculate_difficulty(10, 10, false).difficulty, Difficulty::Advanced);
    }

    #[test]
    fn test_ai_mode_extends_time_and_enables_validation() {
        let plain = calculate_difficulty(5, 5, false);
        let ai = calculate_difficulty(5, 5, true);
        assert_eq!(plain.time_limit_seconds, 25);
        assert_eq!(ai.time_limit_seconds, 40);
        assert!(!plain.ai_validation && !plain.adaptive_mode);
        assert!(ai.ai_validation && ai.adaptive_mode);
        assert_eq!(ai.points_multiplier, 1.5);
    }

    #[test]
    fn test_question_types_grow_with_tier() {
        let advanced = calculate_difficulty(9, 0, false);
        assert!(advanced.question_types.contains(&QuestionType::CodeCompletion));
        assert!(!calculate_difficulty(0, 0, false)
            .question_types
            .contains(&QuestionType::CodeCompletion));
    }
}
