//! Service configuration: per-operation resilience policies, cache and rotation limits.
//!
//! Layering is defaults → YAML document → `SKILLTREE_AI_*` environment overrides.
//! Durations are written in milliseconds (`*_ms` keys).
//!
//! ```yaml
//! question:
//!   breaker:
//!     failure_threshold: 3
//!     reset_timeout_ms: 30000
//!   retry:
//!     max_retries: 2
//!     base_delay_ms: 1000
//!   cache_ttl_ms: 300000
//! cache:
//!   max_entries: 500
//! rotation:
//!   max_questions_per_session: 10
//! ```

use crate::cache::CacheConfig;
use crate::fallback::RotationConfig;
use crate::resilience::{CircuitBreakerConfig, RetryConfig};
use crate::transport::HttpConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Serde adapter storing a `Duration` as whole milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// The three AI-backed operations, each with its own breaker, retry policy and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    QuestionGeneration,
    Explanation,
    SkillTreeExpansion,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::QuestionGeneration,
        Operation::Explanation,
        Operation::SkillTreeExpansion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::QuestionGeneration => "question_generation",
            Operation::Explanation => "explanation",
            Operation::SkillTreeExpansion => "skill_tree_expansion",
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            Operation::QuestionGeneration => "SKILLTREE_AI_QUESTION",
            Operation::Explanation => "SKILLTREE_AI_EXPLANATION",
            Operation::SkillTreeExpansion => "SKILLTREE_AI_SKILL_TREE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationPolicy {
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    #[serde(rename = "cache_ttl_ms", with = "duration_ms")]
    pub cache_ttl: Duration,
}

impl Default for OperationPolicy {
    fn default() -> Self {
        Self {
            breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            cache_ttl: Duration::from_secs(600),
        }
    }
}

impl OperationPolicy {
    /// Called most often: trips fastest and recovers soonest.
    pub fn question_generation() -> Self {
        Self {
            breaker: CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_reset_timeout(Duration::from_secs(30))
                .with_monitoring_window(Duration::from_secs(60)),
            retry: RetryConfig::new()
                .with_max_retries(2)
                .with_base_delay(Duration::from_millis(1000))
                .with_max_delay(Duration::from_secs(5)),
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }

    pub fn explanation() -> Self {
        Self {
            breaker: CircuitBreakerConfig::new()
                .with_failure_threshold(5)
                .with_reset_timeout(Duration::from_secs(60))
                .with_monitoring_window(Duration::from_secs(120)),
            retry: RetryConfig::new()
                .with_max_retries(2)
                .with_base_delay(Duration::from_millis(1000))
                .with_max_delay(Duration::from_secs(8)),
            cache_ttl: Duration::from_secs(10 * 60),
        }
    }

    /// Rare and expensive: tolerates more failures, retries least, stays open longest.
    pub fn skill_tree_expansion() -> Self {
        Self {
            breaker: CircuitBreakerConfig::new()
                .with_failure_threshold(7)
                .with_reset_timeout(Duration::from_secs(120))
                .with_monitoring_window(Duration::from_secs(300)),
            retry: RetryConfig::new()
                .with_max_retries(1)
                .with_base_delay(Duration::from_millis(2000))
                .with_max_delay(Duration::from_secs(10)),
            cache_ttl: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub question: OperationPolicy,
    pub explanation: OperationPolicy,
    pub skill_tree: OperationPolicy,
    pub cache: CacheConfig,
    pub rotation: RotationConfig,
    pub http: Option<HttpConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            question: OperationPolicy::question_generation(),
            explanation: OperationPolicy::explanation(),
            skill_tree: OperationPolicy::skill_tree_expansion(),
            cache: CacheConfig::default(),
            rotation: RotationConfig::default(),
            http: None,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document layered over the defaults.
    ///
    /// Missing fields keep the default of the section they belong to, so a partly
    /// written `skill_tree` section still inherits the skill-tree thresholds.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let overlay: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut merged = serde_yaml::to_value(Self::default())?;
        merge_yaml(&mut merged, overlay);
        Ok(serde_yaml::from_value(merged)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().apply_env_overrides()
    }

    pub fn policy(&self, op: Operation) -> &OperationPolicy {
        match op {
            Operation::QuestionGeneration => &self.question,
            Operation::Explanation => &self.explanation,
            Operation::SkillTreeExpansion => &self.skill_tree,
        }
    }

    fn policy_mut(&mut self, op: Operation) -> &mut OperationPolicy {
        match op {
            Operation::QuestionGeneration => &mut self.question,
            Operation::Explanation => &mut self.explanation,
            Operation::SkillTreeExpansion => &mut self.skill_tree,
        }
    }

    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `SKILLTREE_AI_*` overrides from an arbitrary lookup. Unparseable values are ignored.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let call_timeout = num("SKILLTREE_AI_CALL_TIMEOUT_MS");
        for op in Operation::ALL {
            let prefix = op.env_prefix();
            let policy = self.policy_mut(op);
            if let Some(ms) = call_timeout {
                policy.breaker.call_timeout = Duration::from_millis(ms);
            }
            if let Some(n) = num(&format!("{prefix}_FAILURE_THRESHOLD")) {
                policy.breaker.failure_threshold = n.min(u64::from(u32::MAX)) as u32;
            }
            if let Some(ms) = num(&format!("{prefix}_RESET_TIMEOUT_MS")) {
                policy.breaker.reset_timeout = Duration::from_millis(ms);
            }
            if let Some(n) = num(&format!("{prefix}_MAX_RETRIES")) {
                policy.retry.max_retries = n.min(u64::from(u32::MAX)) as u32;
            }
            if let Some(ms) = num(&format!("{prefix}_CACHE_TTL_MS")) {
                policy.cache_ttl = Duration::from_millis(ms);
            }
        }

        if let Some(v) = lookup("SKILLTREE_AI_CACHE_ENABLED") {
            match v.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "off" | "no" => self.cache.enabled = false,
                "1" | "true" | "on" | "yes" => self.cache.enabled = true,
                _ => {}
            }
        }
        if let Some(n) = num("SKILLTREE_AI_CACHE_MAX_ENTRIES") {
            self.cache.max_entries = n as usize;
        }
        if let Some(url) = lookup("SKILLTREE_AI_BASE_URL") {
            let http = self.http.get_or_insert_with(HttpConfig::default);
            http.base_url = url;
        }
        if let Some(ms) = num("SKILLTREE_AI_HTTP_TIMEOUT_MS") {
            let http = self.http.get_or_insert_with(HttpConfig::default);
            http.timeout = Duration::from_millis(ms);
        }
        self
    }

    /// Reject settings that would make a breaker, cache or rotation bound meaningless.
    pub fn validate(&self) -> Result<()> {
        for op in Operation::ALL {
            let policy = self.policy(op);
            let field = |name: &str| format!("{}.{}", op.name(), name);
            if policy.breaker.failure_threshold == 0 {
                return Err(invalid("failure threshold must be positive", field("breaker.failure_threshold")));
            }
            if policy.breaker.reset_timeout.is_zero() {
                return Err(invalid("reset timeout must be positive", field("breaker.reset_timeout_ms")));
            }
            if policy.breaker.monitoring_window.is_zero() {
                return Err(invalid(
                    "monitoring window must be positive",
                    field("breaker.monitoring_window_ms"),
                ));
            }
            if policy.breaker.call_timeout.is_zero() {
                return Err(invalid("call timeout must be positive", field("breaker.call_timeout_ms")));
            }
            if policy.retry.max_delay < policy.retry.base_delay {
                return Err(invalid("max delay is below base delay", field("retry.max_delay_ms")));
            }
        }
        if self.cache.max_entries == 0 {
            return Err(invalid("cache capacity must be positive", "cache.max_entries".to_string()));
        }
        if self.cache.sweep_interval.is_zero() {
            return Err(invalid("sweep interval must be positive", "cache.sweep_interval_ms".to_string()));
        }
        if self.rotation.max_questions_per_session == 0
            || self.rotation.max_sessions == 0
            || self.rotation.max_users == 0
        {
            return Err(invalid("rotation limits must be positive", "rotation".to_string()));
        }
        Ok(())
    }
}

/// Deep-merge `overlay` into `base`. Mappings merge key by key; anything else replaces.
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    use serde_yaml::Value;
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_yaml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn invalid(msg: &str, field: String) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new().with_field_path(field).with_source("service_config"),
    )
}
