//! Resilient Quiz Demo
//!
//! Runs a short quiz against a flaky in-process generator and shows how the
//! facade keeps serving questions while the circuit opens and recovers.
//!
//! ```text
//! RUST_LOG=skilltree_ai=debug cargo run --example resilient_quiz
//! ```

use async_trait::async_trait;
use skilltree_ai::quiz::{
    calculate_difficulty, calculate_points, generate_hints, question_feedback, LearnerProfile,
    SkillProfile,
};
use skilltree_ai::types::{
    ExplanationRequest, QuestionRequest, QuizQuestion, SkillTreeExpansion, SkillTreeRequest,
};
use skilltree_ai::{
    AiGenerator, AiQuizValidator, Error, Operation, QuizSession, ResilientAiServiceBuilder,
    Result, ServiceConfig, ServiceErrorKind,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers two calls, then fails the next three.
struct FlakyGenerator {
    calls: AtomicU32,
}

#[async_trait]
impl AiGenerator for FlakyGenerator {
    fn name(&self) -> &str {
        "flaky-demo"
    }

    async fn generate_question(&self, req: &QuestionRequest) -> Result<QuizQuestion> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if (2..5).contains(&(n % 8)) {
            return Err(Error::service(ServiceErrorKind::Overloaded, "model overloaded"));
        }
        Ok(QuizQuestion::new(
            format!("[generated #{}] Which statement about {} is true?", n, req.topic),
            vec![
                "It runs at compile time".to_string(),
                "It prevents data races".to_string(),
                "It requires a garbage collector".to_string(),
            ],
            1,
            "The borrow checker rejects aliased mutable access.",
        ))
    }

    async fn generate_explanation(&self, req: &ExplanationRequest) -> Result<String> {
        Ok(format!("\"{}\" is correct because of the ownership rules.", req.correct_answer))
    }

    async fn expand_skill_tree(&self, _req: &SkillTreeRequest) -> Result<SkillTreeExpansion> {
        Err(Error::service(ServiceErrorKind::Unavailable, "skill tree model offline"))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("skilltree_ai=info".parse()?),
        )
        .init();

    let mut config = ServiceConfig::from_env();
    config.question.retry = config.question.retry.clone().with_max_retries(0);
    config.question.breaker = config
        .question
        .breaker
        .clone()
        .with_reset_timeout(Duration::from_millis(300));

    let service = ResilientAiServiceBuilder::new(Arc::new(FlakyGenerator {
        calls: AtomicU32::new(0),
    }))
    .config(config)
    .build()?;
    let maintenance = service.start_maintenance();

    let learner = LearnerProfile::new("demo-user", 2);
    let skill = SkillProfile::new("rust", "Rust", 2);
    let quiz = calculate_difficulty(learner.level, skill.level, true);
    println!(
        "Quiz: {} difficulty, {}s per question, x{} points\n",
        quiz.difficulty, quiz.time_limit_seconds, quiz.points_multiplier
    );

    let mut session = QuizSession::new(&skill.skill_id, skill.level);
    for round in 0..8u32 {
        let req = QuestionRequest::new(&skill.skill_id, format!("borrowing {}", round), quiz.difficulty)
            .for_session(&learner.user_id, &session.session_id);
        let question = service.generate_question(&req).await;
        let state = service.breaker(Operation::QuestionGeneration).state();
        println!("Q{} [{}] {}", round + 1, state, question.question);
        if round == 0 {
            for hint in generate_hints(&question, skill.level) {
                println!("   hint: {}", hint);
            }
        }

        // the demo learner always picks the right answer with time to spare
        let time_left = quiz.time_limit_seconds / 2;
        let points = calculate_points(true, time_left, quiz.time_limit_seconds, session.streak, quiz.difficulty);
        session.record_answer(
            true,
            Duration::from_secs(u64::from(quiz.time_limit_seconds - time_left)),
            skill.level,
            points,
        );
        println!(
            "   +{} points. {}",
            points,
            question_feedback(true, session.streak, time_left, quiz.time_limit_seconds)
        );

        if round == 4 {
            tokio::time::sleep(Duration::from_millis(350)).await;
        }
    }

    let explanation = service
        .generate_explanation(&ExplanationRequest::new(
            "What does the borrow checker prevent?",
            "It runs at compile time",
            "It prevents data races",
            "borrowing",
        ))
        .await;
    println!("\nExplanation: {}", explanation);

    let expansion = service
        .expand_skill_tree(&SkillTreeRequest::new(&skill.skill_id, &skill.name, skill.level))
        .await;
    println!("Unlocked skills:");
    for s in &expansion.new_skills {
        println!("   {} (level {}) after {:?}", s.name, s.level, s.prerequisites);
    }

    let validator = AiQuizValidator::default();
    let result = validator.validate_quiz(&learner, &skill, &session).await;
    println!(
        "\nValidation: {} (score {:.1}, mastery {})\n{}",
        if result.is_validated { "passed" } else { "not yet" },
        result.validation_score,
        result.mastery_level,
        result.feedback
    );

    for (op, stats) in service.breaker_stats() {
        println!(
            "{:<22} {:<9} requests={} failures={} uptime={:.0}%",
            op.name(),
            stats.state.to_string(),
            stats.total_requests,
            stats.failure_count,
            stats.uptime_percent
        );
    }
    let cache = service.cache_stats();
    println!("cache: hits={} misses={} sets={}", cache.hits, cache.misses, cache.sets);

    maintenance.shutdown().await;
    Ok(())
}
