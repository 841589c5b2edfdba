//! Advisory hints and per-answer feedback. Neither affects scoring.

use crate::types::QuizQuestion;
use rand::seq::SliceRandom;
use rand::Rng;

/// `max(1, 3 - skill_level)`.
pub fn hint_count(skill_level: u32) -> usize {
    3usize.saturating_sub(skill_level as usize).max(1)
}

pub fn generate_hints(question: &QuizQuestion, skill_level: u32) -> Vec<String> {
    generate_hints_with_rng(question, skill_level, &mut rand::thread_rng())
}

/// Candidates in order: the question's explanation, one eliminated wrong option,
/// and for skill levels up to 2 a reminder to focus on basics.
pub fn generate_hints_with_rng<R: Rng + ?Sized>(
    question: &QuizQuestion,
    skill_level: u32,
    rng: &mut R,
) -> Vec<String> {
    let mut hints = Vec::with_capacity(3);

    let explanation = question.explanation.trim();
    if !explanation.is_empty() {
        hints.push(format!("Think about this: {}", explanation));
    }

    let wrong: Vec<&String> = question
        .options
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != question.correct_answer)
        .map(|(_, o)| o)
        .collect();
    if let Some(option) = wrong.choose(rng) {
        hints.push(format!("You can rule out \"{}\".", option));
    }

    if skill_level <= 2 {
        hints.push(
            "Focus on the basics: reread the question and eliminate answers that are clearly off-topic."
                .to_string(),
        );
    }

    hints.truncate(hint_count(skill_level));
    hints
}

/// Short message shown after an answer. `streak` is the streak including this answer.
pub fn question_feedback(is_correct: bool, streak: u32, time_left: u32, total_time: u32) -> String {
    if !is_correct {
        return if time_left == 0 {
            "Time's up! Read the explanation and try the next one.".to_string()
        } else {
            "Not quite. Read the explanation to see why.".to_string()
        };
    }
    let fast = total_time > 0 && f64::from(time_left) / f64::from(total_time) >= 0.7;
    match streak {
        s if s >= 5 => format!("Outstanding! {} correct answers in a row!", s),
        s if s >= 3 => format!("Great streak! {} in a row.", s),
        _ if fast => "Correct, and quick!".to_string(),
        _ => "Correct!".to_string(),
    }
}
