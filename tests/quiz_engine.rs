//! Quiz engine scenarios: a full session scored, then validated.

use async_trait::async_trait;
use skilltree_ai::quiz::{
    calculate_difficulty, calculate_points, generate_hints, question_feedback, AiQuizValidator,
    AnalysisInput, LearnerProfile, MasteryLevel, QuizSession, SessionAnalyzer, SessionScores,
    SkillProfile,
};
use skilltree_ai::types::Difficulty;
use skilltree_ai::{Error, FallbackPool, Result, ServiceErrorKind};
use std::sync::Arc;
use std::time::Duration;

struct Unreachable;

#[async_trait]
impl SessionAnalyzer for Unreachable {
    async fn analyze(&self, _input: &AnalysisInput<'_>) -> Result<SessionScores> {
        Err(Error::service(ServiceErrorKind::Unavailable, "analysis service down"))
    }
}

/// `total` answers ending in `correct_tail` correct ones, optionally followed by a miss.
fn session_with(correct_tail: u32, total: u32, streak_break_at_end: bool) -> QuizSession {
    let mut session = QuizSession::new("javascript", 2);
    for i in 0..total {
        let correct = i >= total - correct_tail;
        session.record_answer(correct, Duration::from_secs(8), 2, if correct { 12 } else { 0 });
    }
    if streak_break_at_end {
        session.record_answer(false, Duration::from_secs(8), 2, 0);
    }
    session
}

#[tokio::test]
async fn test_failing_analysis_uses_simple_rule() {
    // correct 8 of 10, streak 4: two wrong answers interleaved before the final run
    let mut session = QuizSession::new("javascript", 2);
    let pattern = [true, true, false, true, true, false, true, true, true, true];
    for ok in pattern {
        session.record_answer(ok, Duration::from_secs(10), 2, if ok { 15 } else { 0 });
    }
    assert_eq!(session.correct_answers, 8);
    assert_eq!(session.questions_answered, 10);
    assert_eq!(session.streak, 4);

    let validator = AiQuizValidator::new(Arc::new(Unreachable));
    let result = validator
        .validate_quiz(
            &LearnerProfile::new("learner-1", 3),
            &SkillProfile::new("javascript", "JavaScript", 4),
            &session,
        )
        .await;

    assert!(result.is_validated);
    assert_eq!(result.validation_score, 80.0);
    assert_eq!(result.mastery_level, MasteryLevel::Advanced);
    assert_eq!(result.next_recommendations.difficulty, 5);
    // the session is still remembered
    assert_eq!(validator.history("learner-1", "javascript").len(), 1);
}

#[tokio::test]
async fn test_simple_rule_needs_five_answers() {
    let validator = AiQuizValidator::new(Arc::new(Unreachable));
    let result = validator
        .validate_quiz(
            &LearnerProfile::new("u", 0),
            &SkillProfile::new("javascript", "JavaScript", 0),
            &session_with(4, 4, false),
        )
        .await;
    assert!(!result.is_validated);
}

#[tokio::test]
async fn test_heuristic_validation_requires_tier_question_count() {
    let validator = AiQuizValidator::default();
    let learner = LearnerProfile::new("u", 2);

    // expert-tier skill needs 12 answers; 10 perfect answers are not enough
    let expert = SkillProfile::new("javascript", "JavaScript", 9);
    let result = validator.validate_quiz(&learner, &expert, &session_with(10, 10, false)).await;
    assert!(!result.is_validated);
    assert!(result.feedback.contains("at least 12 questions"), "{}", result.feedback);

    // the same run validates a beginner-tier skill
    let beginner = SkillProfile::new("javascript", "JavaScript", 2);
    let result = validator.validate_quiz(&learner, &beginner, &session_with(10, 10, false)).await;
    assert!(result.is_validated, "{:?}", result);
    assert!(result.validation_score >= MasteryLevel::Beginner.min_score());
}

#[tokio::test]
async fn test_broken_streak_blocks_validation() {
    let validator = AiQuizValidator::default();
    let result = validator
        .validate_quiz(
            &LearnerProfile::new("u", 1),
            &SkillProfile::new("javascript", "JavaScript", 1),
            &session_with(9, 9, true),
        )
        .await;
    assert!(!result.is_validated);
}

#[test]
fn test_session_walkthrough() {
    let config = calculate_difficulty(1, 1, false);
    assert_eq!(config.difficulty, Difficulty::Beginner);
    assert_eq!(config.time_limit_seconds, 30);

    let pool = FallbackPool::builtin();
    let question = &pool.questions_for("javascript")[0];
    let hints = generate_hints(question, 1);
    assert_eq!(hints.len(), 2);

    let mut session = QuizSession::new("javascript", 1);
    let mut streak = 0;
    for (correct, time_left) in [(true, 30), (true, 18), (false, 0), (true, 20)] {
        let points = calculate_points(correct, time_left, config.time_limit_seconds, streak, config.difficulty);
        streak = if correct { streak + 1 } else { 0 };
        session.record_answer(
            correct,
            Duration::from_secs(u64::from(config.time_limit_seconds - time_left)),
            1,
            points,
        );
        let message = question_feedback(correct, streak, time_left, config.time_limit_seconds);
        assert!(!message.is_empty());
    }
    // 10 * 1.5, 10 * (1 + 0.3 + 0.2), 0, 10 * 1.33
    assert_eq!(session.total_points, 15 + 15 + 13);
    assert_eq!(session.streak, 1);
    assert_eq!(session.accuracy(), 0.75);
}
