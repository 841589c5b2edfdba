//! Rotation properties over the built-in question bank.

use skilltree_ai::fallback::{FallbackPool, RotationConfig, RotationManager, GENERAL_POOL};
use std::collections::HashSet;
use std::sync::Arc;

fn manager(config: RotationConfig) -> RotationManager {
    RotationManager::new(Arc::new(FallbackPool::builtin()), config)
}

#[test]
fn test_no_repeats_until_pool_exhausted() {
    let rotation = manager(RotationConfig::default());
    let n = FallbackPool::builtin().pool_size("python");

    for round in 0..3 {
        let mut seen = HashSet::new();
        for i in 0..n {
            // a fresh session per call so the session cap never interferes
            let session = format!("r{}-{}", round, i);
            let q = rotation.next_question("ada", "python", &session).unwrap();
            assert!(seen.insert(q.index), "index {} repeated in round {}", q.index, round);
        }
        assert_eq!(seen.len(), n);
    }
}

#[test]
fn test_session_cap_ends_quiz() {
    let rotation = manager(RotationConfig::default());
    for expected in 1..=10 {
        let q = rotation.next_question("ada", GENERAL_POOL, "s").unwrap();
        assert_eq!(q.position, expected);
    }
    assert!(rotation.next_question("ada", GENERAL_POOL, "s").is_none());
    assert_eq!(rotation.session_count("s"), 10);

    rotation.reset_session("s");
    assert!(rotation.next_question("ada", GENERAL_POOL, "s").is_some());
}

#[test]
fn test_unknown_skill_rotates_general_pool() {
    let rotation = manager(RotationConfig::default());
    let general = FallbackPool::builtin();
    let q = rotation.next_question("ada", "quantum-basket-weaving", "s").unwrap();
    assert!(general.questions_for(GENERAL_POOL).contains(&q.question));
}

#[test]
fn test_state_is_bounded() {
    let rotation = manager(RotationConfig {
        max_questions_per_session: 10,
        max_sessions: 100,
        max_users: 50,
    });
    for i in 0..300 {
        rotation.next_question(&format!("user-{}", i), "rust", &format!("session-{}", i));
    }
    let stats = rotation.stats();
    assert_eq!(stats.tracked_sessions, 100);
    assert_eq!(stats.tracked_histories, 50);
    // the oldest session was evicted, so its counter restarts
    assert_eq!(rotation.session_count("session-0"), 0);
    assert_eq!(rotation.session_count("session-299"), 1);
}
