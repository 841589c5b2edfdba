//! Non-repeating rotation over the fallback pool.
//!
//! Two pieces of state, both LRU-bounded:
//! - per (user, skill): indices already served; cleared when the pool is exhausted
//! - per session: questions served so far, capped at `max_questions_per_session`
//!
//! Reaching the session cap makes [`RotationManager::next_question`] return `None`,
//! which is how a fallback-only quiz ends.

use super::pool::FallbackPool;
use crate::types::QuizQuestion;
use lru::LruCache;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub max_questions_per_session: u32,
    /// Session counters kept before the least recently used is dropped.
    pub max_sessions: usize,
    /// (user, skill) histories kept before the least recently used is dropped.
    pub max_users: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_questions_per_session: 10,
            max_sessions: 100,
            max_users: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedQuestion {
    /// Index into the skill's pool.
    pub index: usize,
    pub question: QuizQuestion,
    /// 1-based position of this question within its session.
    pub position: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationStats {
    pub tracked_sessions: usize,
    pub tracked_histories: usize,
}

struct RotationState {
    sessions: LruCache<String, u32>,
    histories: LruCache<(String, String), HashSet<usize>>,
}

pub struct RotationManager {
    config: RotationConfig,
    pool: Arc<FallbackPool>,
    state: Mutex<RotationState>,
}

fn capacity(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
}

impl RotationManager {
    pub fn new(pool: Arc<FallbackPool>, config: RotationConfig) -> Self {
        let state = RotationState {
            sessions: LruCache::new(capacity(config.max_sessions)),
            histories: LruCache::new(capacity(config.max_users)),
        };
        Self {
            config,
            pool,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Next unseen question for the user, or `None` once the session reached its cap
    /// (or the pool is empty).
    pub fn next_question(
        &self,
        user_id: &str,
        skill_id: &str,
        session_id: &str,
    ) -> Option<RotatedQuestion> {
        let pool = self.pool.questions_for(skill_id);
        if pool.is_empty() {
            return None;
        }

        let mut st = self.lock();
        let served = st.sessions.get(session_id).copied().unwrap_or(0);
        if served >= self.config.max_questions_per_session {
            debug!(session_id, served, "fallback session complete");
            return None;
        }

        let history_key = (user_id.to_string(), skill_id.to_string());
        let used = st.histories.get_or_insert_mut(history_key, HashSet::new);
        let mut available: Vec<usize> = (0..pool.len()).filter(|i| !used.contains(i)).collect();
        if available.is_empty() {
            debug!(user_id, skill_id, "fallback pool exhausted, reshuffling");
            used.clear();
            available = (0..pool.len()).collect();
        }
        let index = available[rand::thread_rng().gen_range(0..available.len())];
        used.insert(index);

        let position = served + 1;
        st.sessions.put(session_id.to_string(), position);

        Some(RotatedQuestion {
            index,
            question: pool[index].clone(),
            position,
        })
    }

    pub fn session_count(&self, session_id: &str) -> u32 {
        self.lock().sessions.peek(session_id).copied().unwrap_or(0)
    }

    pub fn reset_session(&self, session_id: &str) {
        self.lock().sessions.pop(session_id);
    }

    pub fn stats(&self) -> RotationStats {
        let st = self.lock();
        RotationStats {
            tracked_sessions: st.sessions.len(),
            tracked_histories: st.histories.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(n: usize) -> Arc<FallbackPool> {
        let questions = (0..n)
            .map(|i| QuizQuestion::new(format!("q{i}?"), vec!["a".into(), "b".into()], 0, ""))
            .collect();
        Arc::new(FallbackPool::empty().with_skill("s", questions))
    }

    #[test]
    fn test_no_repeats_until_pool_exhausted() {
        let rm = RotationManager::new(small_pool(6), RotationConfig::default());
        let mut seen = HashSet::new();
        for i in 0..6 {
            // fresh session per call so the session cap never interferes
            let r = rm.next_question("u", "s", &format!("sess-{i}")).unwrap();
            assert!(seen.insert(r.index), "index {} repeated", r.index);
        }
        assert_eq!(seen.len(), 6);

        // pool exhausted: reshuffle instead of stopping
        let r = rm.next_question("u", "s", "sess-next").unwrap();
        assert!(r.index < 6);
    }

    #[test]
    fn test_session_cap() {
        let rm = RotationManager::new(small_pool(4), RotationConfig::default());
        for i in 1..=10 {
            let r = rm.next_question("u", "s", "sess").unwrap();
            assert_eq!(r.position, i);
        }
        assert_eq!(rm.session_count("sess"), 10);
        assert!(rm.next_question("u", "s", "sess").is_none());

        rm.reset_session("sess");
        assert!(rm.next_question("u", "s", "sess").is_some());
    }

    #[test]
    fn test_histories_are_per_user_and_skill() {
        let rm = RotationManager::new(small_pool(1), RotationConfig::default());
        assert_eq!(rm.next_question("alice", "s", "a1").unwrap().index, 0);
        assert_eq!(rm.next_question("bob", "s", "b1").unwrap().index, 0);
        assert_eq!(rm.stats().tracked_histories, 2);
    }

    #[test]
    fn test_lru_bounds() {
        let config = RotationConfig {
            max_questions_per_session: 10,
            max_sessions: 3,
            max_users: 2,
        };
        let rm = RotationManager::new(small_pool(3), config);
        for i in 0..5 {
            rm.next_question(&format!("user-{i}"), "s", &format!("sess-{i}"));
        }
        let stats = rm.stats();
        assert_eq!(stats.tracked_sessions, 3);
        assert_eq!(stats.tracked_histories, 2);
        // oldest session counter was evicted
        assert_eq!(rm.session_count("sess-0"), 0);
        assert_eq!(rm.session_count("sess-4"), 1);
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let rm = RotationManager::new(Arc::new(FallbackPool::empty()), RotationConfig::default());
        assert!(rm.next_question("u", "s", "sess").is_none());
    }
}
