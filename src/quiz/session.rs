use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// In-memory record of one quiz run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    pub session_id: String,
    pub skill_id: String,
    pub current_level: u32,
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub total_points: u64,
    /// Epoch milliseconds.
    pub start_time: u64,
    /// Milliseconds per answered question.
    pub response_times: Vec<u64>,
    /// Difficulty level of each answered question.
    pub difficulty_progression: Vec<u32>,
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl QuizSession {
    pub fn new(skill_id: impl Into<String>, current_level: u32) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            skill_id: skill_id.into(),
            current_level,
            questions_answered: 0,
            correct_answers: 0,
            streak: 0,
            total_points: 0,
            start_time: epoch_ms(),
            response_times: Vec::new(),
            difficulty_progression: Vec::new(),
        }
    }

    pub fn record_answer(&mut self, correct: bool, response_time: Duration, difficulty_level: u32, points: u32) {
        self.questions_answered += 1;
        if correct {
            self.correct_answers += 1;
            self.streak += 1;
            self.total_points += u64::from(points);
        } else {
            self.streak = 0;
        }
        self.response_times.push(response_time.as_millis() as u64);
        self.difficulty_progression.push(difficulty_level);
        self.current_level = difficulty_level;
    }

    /// Fraction of correct answers, 0 before the first answer.
    pub fn accuracy(&self) -> f64 {
        if self.questions_answered == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.questions_answered)
        }
    }

    pub fn average_response_time(&self) -> Option<Duration> {
        if self.response_times.is_empty() {
            return None;
        }
        let total: u64 = self.response_times.iter().sum();
        Some(Duration::from_millis(total / self.response_times.len() as u64))
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(epoch_ms().saturating_sub(self.start_time))
    }
}
