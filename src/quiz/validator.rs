//! Session validation and mastery scoring.
//!
//! A completed [`QuizSession`] is scored on four axes, each in `0.0..=1.0`:
//!
//! | Axis | Weight |
//! |------|--------|
//! | accuracy | 40% |
//! | consistency | 25% |
//! | difficulty progression | 20% |
//! | time efficiency | 15% |
//!
//! The weighted sum (×100) is the validation score. A session validates only when
//! the score and question count meet the tier required by the skill level, the
//! streak is at least 3 and time efficiency is at least 0.5.
//!
//! The axis scores come from a [`SessionAnalyzer`]. If it fails or returns
//! nonsense, validation falls back to: accuracy ≥ 0.7 and at least 5 answers.

use super::difficulty::calculate_difficulty;
use super::session::QuizSession;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const ACCURACY_WEIGHT: f64 = 0.40;
const CONSISTENCY_WEIGHT: f64 = 0.25;
const PROGRESSION_WEIGHT: f64 = 0.20;
const TIME_WEIGHT: f64 = 0.15;

const MIN_STREAK: u32 = 3;
const MIN_TIME_EFFICIENCY: f64 = 0.5;

const SIMPLE_MIN_ACCURACY: f64 = 0.7;
const SIMPLE_MIN_QUESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl MasteryLevel {
    /// Tier a learner must demonstrate to validate a skill of this level.
    pub fn required_for_skill(skill_level: u32) -> Self {
        match skill_level {
            0..=1 => MasteryLevel::Novice,
            2..=3 => MasteryLevel::Beginner,
            4..=5 => MasteryLevel::Intermediate,
            6..=7 => MasteryLevel::Advanced,
            _ => MasteryLevel::Expert,
        }
    }

    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            MasteryLevel::Expert
        } else if score >= 80.0 {
            MasteryLevel::Advanced
        } else if score >= 70.0 {
            MasteryLevel::Intermediate
        } else if score >= 60.0 {
            MasteryLevel::Beginner
        } else {
            MasteryLevel::Novice
        }
    }

    pub fn min_score(&self) -> f64 {
        match self {
            MasteryLevel::Novice => 60.0,
            MasteryLevel::Beginner => 65.0,
            MasteryLevel::Intermediate => 75.0,
            MasteryLevel::Advanced => 85.0,
            MasteryLevel::Expert => 90.0,
        }
    }

    pub fn min_questions(&self) -> u32 {
        match self {
            MasteryLevel::Novice => 3,
            MasteryLevel::Beginner => 5,
            MasteryLevel::Intermediate => 8,
            MasteryLevel::Advanced => 10,
            MasteryLevel::Expert => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::Novice => "novice",
            MasteryLevel::Beginner => "beginner",
            MasteryLevel::Intermediate => "intermediate",
            MasteryLevel::Advanced => "advanced",
            MasteryLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub user_id: String,
    pub level: u32,
}

impl LearnerProfile {
    pub fn new(user_id: impl Into<String>, level: u32) -> Self {
        Self {
            user_id: user_id.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProfile {
    pub skill_id: String,
    pub name: String,
    pub level: u32,
}

impl SkillProfile {
    pub fn new(skill_id: impl Into<String>, name: impl Into<String>, level: u32) -> Self {
        Self {
            skill_id: skill_id.into(),
            name: name.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRecommendations {
    pub difficulty: u32,
    pub question_count: u32,
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizValidationResult {
    pub is_validated: bool,
    /// 0–100.
    pub validation_score: f64,
    pub mastery_level: MasteryLevel,
    pub feedback: String,
    pub next_recommendations: NextRecommendations,
}

/// Condensed record of a past session kept in the validator's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub accuracy: f64,
    pub questions_answered: u32,
    pub average_response_ms: u64,
    pub final_level: u32,
    pub validation_score: f64,
    /// Epoch milliseconds.
    pub recorded_at: u64,
}

/// Axis scores, each expected in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScores {
    pub accuracy: f64,
    pub consistency: f64,
    pub progression: f64,
    pub time_efficiency: f64,
}

impl SessionScores {
    /// Weighted score on a 0–100 scale, rounded to one decimal.
    pub fn weighted(&self) -> f64 {
        let raw = self.accuracy * ACCURACY_WEIGHT
            + self.consistency * CONSISTENCY_WEIGHT
            + self.progression * PROGRESSION_WEIGHT
            + self.time_efficiency * TIME_WEIGHT;
        (raw * 1000.0).round() / 10.0
    }

    fn check(&self) -> Result<()> {
        let axes = [
            ("accuracy", self.accuracy),
            ("consistency", self.consistency),
            ("progression", self.progression),
            ("time_efficiency", self.time_efficiency),
        ];
        for (name, value) in axes {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::validation_with_context(
                    format!("analyzer returned {} for {}", value, name),
                    ErrorContext::new()
                        .with_field_path(name)
                        .with_details("expected a value in 0..=1")
                        .with_source("session_analyzer"),
                ));
            }
        }
        Ok(())
    }
}

/// Everything an analyzer may look at.
pub struct AnalysisInput<'a> {
    pub learner: &'a LearnerProfile,
    pub skill: &'a SkillProfile,
    pub session: &'a QuizSession,
    /// Oldest first, excluding `session`.
    pub history: &'a [SessionSummary],
    pub time_limit_seconds: u32,
}

/// Produces the four axis scores for a session.
#[async_trait]
pub trait SessionAnalyzer: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput<'_>) -> Result<SessionScores>;
}

/// Local statistics over the session and its history.
///
/// - consistency: half from response-time spread (1 − coefficient of variation),
///   half from accuracy spread across history (1 − 2σ)
/// - progression: share of non-decreasing difficulty steps, blended with the
///   accuracy gain over the historical mean
/// - time efficiency: `1 − average response / time limit`
///
/// Axes without enough data score a neutral 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

impl HeuristicAnalyzer {
    fn consistency(session: &QuizSession, history: &[SessionSummary]) -> f64 {
        let times: Vec<f64> = session.response_times.iter().map(|t| *t as f64).collect();
        let timing = if times.len() < 2 || mean(&times) == 0.0 {
            0.5
        } else {
            (1.0 - std_dev(&times) / mean(&times)).clamp(0.0, 1.0)
        };

        let mut accuracies: Vec<f64> = history.iter().map(|h| h.accuracy).collect();
        accuracies.push(session.accuracy());
        let stability = if accuracies.len() < 2 {
            0.5
        } else {
            (1.0 - 2.0 * std_dev(&accuracies)).clamp(0.0, 1.0)
        };
        (timing + stability) / 2.0
    }

    fn progression(session: &QuizSession, history: &[SessionSummary]) -> f64 {
        let levels = &session.difficulty_progression;
        let steps = if levels.len() < 2 {
            0.5
        } else {
            let rising = levels.windows(2).filter(|w| w[1] >= w[0]).count();
            rising as f64 / (levels.len() - 1) as f64
        };
        if history.is_empty() {
            return steps;
        }
        let past = mean(&history.iter().map(|h| h.accuracy).collect::<Vec<_>>());
        let gain = if past <= 0.0 {
            1.0
        } else {
            (session.accuracy() / past).min(1.0)
        };
        (0.7 * steps + 0.3 * gain).clamp(0.0, 1.0)
    }

    fn time_efficiency(session: &QuizSession, time_limit_seconds: u32) -> f64 {
        match session.average_response_time() {
            Some(avg) if time_limit_seconds > 0 => {
                (1.0 - avg.as_secs_f64() / f64::from(time_limit_seconds)).clamp(0.0, 1.0)
            }
            _ => 0.5,
        }
    }
}

#[async_trait]
impl SessionAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, input: &AnalysisInput<'_>) -> Result<SessionScores> {
        if input.session.questions_answered == 0 {
            return Err(Error::validation_with_context(
                "session has no answers",
                ErrorContext::new().with_source("heuristic_analyzer"),
            ));
        }
        Ok(SessionScores {
            accuracy: input.session.accuracy(),
            consistency: Self::consistency(input.session, input.history),
            progression: Self::progression(input.session, input.history),
            time_efficiency: Self::time_efficiency(input.session, input.time_limit_seconds),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Sessions remembered per (user, skill).
    pub history_per_pair: usize,
    /// Distinct (user, skill) pairs remembered; least recently validated go first.
    pub max_tracked_pairs: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            history_per_pair: 20,
            max_tracked_pairs: 1000,
        }
    }
}

type HistoryKey = (String, String);

/// Validates completed sessions and remembers a short history per learner and skill.
pub struct AiQuizValidator {
    analyzer: Arc<dyn SessionAnalyzer>,
    history: Mutex<LruCache<HistoryKey, VecDeque<SessionSummary>>>,
    config: ValidatorConfig,
}

impl AiQuizValidator {
    pub fn new(analyzer: Arc<dyn SessionAnalyzer>) -> Self {
        Self::with_config(analyzer, ValidatorConfig::default())
    }

    pub fn with_config(analyzer: Arc<dyn SessionAnalyzer>, config: ValidatorConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_tracked_pairs).unwrap_or(NonZeroUsize::MIN);
        Self {
            analyzer,
            history: Mutex::new(LruCache::new(cap)),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<HistoryKey, VecDeque<SessionSummary>>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Score `session` and record it. Never fails: analyzer errors degrade to the
    /// accuracy/answer-count rule.
    pub async fn validate_quiz(
        &self,
        learner: &LearnerProfile,
        skill: &SkillProfile,
        session: &QuizSession,
    ) -> QuizValidationResult {
        let history = self.history(&learner.user_id, &skill.skill_id);
        let time_limit_seconds = calculate_difficulty(learner.level, skill.level, true).time_limit_seconds;
        let input = AnalysisInput {
            learner,
            skill,
            session,
            history: &history,
            time_limit_seconds,
        };

        let scored = self
            .analyzer
            .analyze(&input)
            .await
            .and_then(|scores| scores.check().map(|()| scores));
        let result = match scored {
            Ok(scores) => evaluate(skill, session, &scores),
            Err(e) => {
                warn!(
                    user = %learner.user_id,
                    skill = %skill.skill_id,
                    error = %e,
                    "session analysis failed, using simple validation"
                );
                simple_validation(skill, session)
            }
        };
        debug!(
            user = %learner.user_id,
            skill = %skill.skill_id,
            score = result.validation_score,
            validated = result.is_validated,
            mastery = %result.mastery_level,
            "quiz validated"
        );

        self.record(learner, skill, session, result.validation_score);
        result
    }

    /// Remembered summaries for the pair, oldest first.
    pub fn history(&self, user_id: &str, skill_id: &str) -> Vec<SessionSummary> {
        let key = (user_id.to_string(), skill_id.to_string());
        self.lock()
            .peek(&key)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_history(&self, user_id: &str, skill_id: &str) {
        let key = (user_id.to_string(), skill_id.to_string());
        self.lock().pop(&key);
    }

    fn record(&self, learner: &LearnerProfile, skill: &SkillProfile, session: &QuizSession, score: f64) {
        let summary = SessionSummary {
            session_id: session.session_id.clone(),
            accuracy: session.accuracy(),
            questions_answered: session.questions_answered,
            average_response_ms: session
                .average_response_time()
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            final_level: session.current_level,
            validation_score: score,
            recorded_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };
        let max = self.config.history_per_pair.max(1);
        let mut map = self.lock();
        let entries = map.get_or_insert_mut((learner.user_id.clone(), skill.skill_id.clone()), VecDeque::new);
        entries.push_back(summary);
        while entries.len() > max {
            entries.pop_front();
        }
    }
}

impl Default for AiQuizValidator {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicAnalyzer))
    }
}

fn evaluate(skill: &SkillProfile, session: &QuizSession, scores: &SessionScores) -> QuizValidationResult {
    let score = scores.weighted();
    let required = MasteryLevel::required_for_skill(skill.level);

    let mut shortfalls = Vec::new();
    if score < required.min_score() {
        shortfalls.push(format!(
            "reach a score of {} (you scored {:.1})",
            required.min_score(),
            score
        ));
    }
    if session.questions_answered < required.min_questions() {
        shortfalls.push(format!("answer at least {} questions", required.min_questions()));
    }
    if session.streak < MIN_STREAK {
        shortfalls.push(format!("finish with a streak of at least {}", MIN_STREAK));
    }
    if scores.time_efficiency < MIN_TIME_EFFICIENCY {
        shortfalls.push("answer a little faster".to_string());
    }
    let is_validated = shortfalls.is_empty();

    let mut focus_areas = Vec::new();
    if scores.accuracy < 0.7 {
        focus_areas.push(format!("core concepts of {}", skill.name));
    }
    if scores.consistency < 0.6 {
        focus_areas.push("consistent practice".to_string());
    }
    if scores.progression < 0.6 {
        focus_areas.push("harder questions".to_string());
    }
    if scores.time_efficiency < MIN_TIME_EFFICIENCY {
        focus_areas.push("response speed".to_string());
    }

    let mastery_level = MasteryLevel::from_score(score);
    let feedback = if is_validated {
        format!(
            "{} validated at {} level with a score of {:.1}.",
            skill.name, mastery_level, score
        )
    } else {
        format!(
            "Not validated yet. To validate {} at the {} tier: {}.",
            skill.name,
            required,
            shortfalls.join("; ")
        )
    };

    let difficulty = if is_validated {
        skill.level + 1
    } else if score < 50.0 {
        skill.level.saturating_sub(1)
    } else {
        skill.level
    };
    let question_count = MasteryLevel::required_for_skill(difficulty).min_questions();

    QuizValidationResult {
        is_validated,
        validation_score: score,
        mastery_level,
        feedback,
        next_recommendations: NextRecommendations {
            difficulty,
            question_count,
            focus_areas,
        },
    }
}

fn simple_validation(skill: &SkillProfile, session: &QuizSession) -> QuizValidationResult {
    let accuracy = session.accuracy();
    let is_validated = accuracy >= SIMPLE_MIN_ACCURACY && session.questions_answered >= SIMPLE_MIN_QUESTIONS;
    let score = (accuracy * 1000.0).round() / 10.0;
    let feedback = if is_validated {
        format!("{} validated with {:.0}% accuracy.", skill.name, accuracy * 100.0)
    } else {
        format!(
            "Not validated yet: reach {:.0}% accuracy over at least {} questions.",
            SIMPLE_MIN_ACCURACY * 100.0,
            SIMPLE_MIN_QUESTIONS
        )
    };
    QuizValidationResult {
        is_validated,
        validation_score: score,
        mastery_level: MasteryLevel::from_score(score),
        feedback,
        next_recommendations: NextRecommendations {
            difficulty: if is_validated { skill.level + 1 } else { skill.level },
            question_count: SIMPLE_MIN_QUESTIONS,
            focus_areas: if is_validated {
                Vec::new()
            } else {
                vec![format!("core concepts of {}", skill.name)]
            },
        },
    }
}
