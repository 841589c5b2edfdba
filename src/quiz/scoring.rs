//! Point awards.
//!
//! `points = round(base * (1 + time_bonus + streak_bonus + difficulty_bonus))`
//!
//! | Term | Value |
//! |------|-------|
//! | base | 10 / 15 / 20 by difficulty |
//! | time_bonus | `time_left / total_time * 0.5` |
//! | streak_bonus | `min(streak * 0.2, 1.0)` |
//! | difficulty_bonus | 0 / 0.25 / 0.5 by difficulty |
//!
//! The AI-enhanced variant adds up to 0.2 from a 0–100 difficulty score and up
//! to 0.15 from a 0–1 consistency score.

use crate::types::Difficulty;

pub fn base_points(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Beginner => 10,
        Difficulty::Intermediate => 15,
        Difficulty::Advanced => 20,
    }
}

fn difficulty_bonus(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Beginner => 0.0,
        Difficulty::Intermediate => 0.25,
        Difficulty::Advanced => 0.5,
    }
}

fn multiplier(time_left: u32, total_time: u32, streak: u32, difficulty: Difficulty) -> f64 {
    let time_bonus = if total_time == 0 {
        0.0
    } else {
        f64::from(time_left.min(total_time)) / f64::from(total_time) * 0.5
    };
    let streak_bonus = (f64::from(streak) * 0.2).min(1.0);
    1.0 + time_bonus + streak_bonus + difficulty_bonus(difficulty)
}

/// Points for one answer; incorrect answers earn nothing.
pub fn calculate_points(
    is_correct: bool,
    time_left: u32,
    total_time: u32,
    streak: u32,
    difficulty: Difficulty,
) -> u32 {
    if !is_correct {
        return 0;
    }
    let m = multiplier(time_left, total_time, streak, difficulty);
    (f64::from(base_points(difficulty)) * m).round() as u32
}

/// [`calculate_points`] plus bonuses from the adaptive engine.
///
/// `difficulty_score` is clamped to 0–100 and `consistency` to 0–1.
pub fn calculate_ai_enhanced_points(
    is_correct: bool,
    time_left: u32,
    total_time: u32,
    streak: u32,
    difficulty: Difficulty,
    difficulty_score: f64,
    consistency: f64,
) -> u32 {
    if !is_correct {
        return 0;
    }
    let difficulty_score = if difficulty_score.is_finite() { difficulty_score.clamp(0.0, 100.0) } else { 0.0 };
    let consistency = if consistency.is_finite() { consistency.clamp(0.0, 1.0) } else { 0.0 };
    let m = multiplier(time_left, total_time, streak, difficulty)
        + difficulty_score / 100.0 * 0.2
        + consistency * 0.15;
    (f64::from(base_points(difficulty)) * m).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incorrect_scores_zero() {
        for d in [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced] {
            assert_eq!(calculate_points(false, 30, 30, 10, d), 0);
            assert_eq!(calculate_ai_enhanced_points(false, 30, 30, 10, d, 100.0, 1.0), 0);
        }
    }

    #[test]
    fn test_full_time_no_streak_beginner() {
        assert_eq!(calculate_points(true, 30, 30, 0, Difficulty::Beginner), 15);
    }

    #[test]
    fn test_bonuses() {
        // 15 * (1 + 0.5 + 0.4 + 0.25) = 32.25
        assert_eq!(calculate_points(true, 20, 20, 2, Difficulty::Intermediate), 32);
        // streak bonus caps at 1.0: 20 * (1 + 0 + 1 + 0.5)
        assert_eq!(calculate_points(true, 0, 20, 12, Difficulty::Advanced), 50);
        // time_left beyond total counts as full time
        assert_eq!(calculate_points(true, 99, 30, 0, Difficulty::Beginner), 15);
        assert_eq!(calculate_points(true, 5, 0, 0, Difficulty::Beginner), 10);
    }

    #[test]
    fn test_ai_enhanced_adds_at_most_35_percent() {
        let plain = calculate_points(true, 30, 30, 0, Difficulty::Beginner);
        let boosted = calculate_ai_enhanced_points(true, 30, 30, 0, Difficulty::Beginner, 100.0, 0.5);
        // 10 * (1.5 + 0.2 + 0.075)
        assert_eq!(boosted, 18);
        assert!(boosted > plain);
        let clamped = calculate_ai_enhanced_points(true, 30, 30, 0, Difficulty::Beginner, 500.0, f64::NAN);
        assert_eq!(clamped, 17);
    }
}
