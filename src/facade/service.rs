use super::generator::AiGenerator;
use super::maintenance::MaintenanceHandle;
use crate::cache::{CacheKey, CacheKeyGenerator, CacheManager, CacheStats};
use crate::config::{Operation, ServiceConfig};
use crate::error_code::ServiceErrorKind;
use crate::fallback::FallbackService;
use crate::resilience::{CircuitBreaker, CircuitBreakerStats};
use crate::types::{
    Difficulty, ExplanationRequest, QuestionRequest, QuizQuestion, SkillTreeExpansion,
    SkillTreeRequest,
};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a resilient call's value came from. Only primary results are cached.
enum Source {
    Primary,
    Fallback,
}

/// Outcome of a synthetic call to the primary generator.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generator: String,
    pub healthy: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub error_kind: Option<ServiceErrorKind>,
}

/// Always-available front door to the AI generator.
///
/// Every operation runs the same pipeline:
/// cache lookup → operation breaker → retry policy → primary generator, with the
/// static fallback answering whenever the breaker rejects or the retries run out.
/// The question, explanation and skill-tree operations never return an error.
pub struct ResilientAiService {
    primary: Arc<dyn AiGenerator>,
    fallback: Arc<FallbackService>,
    cache: Arc<CacheManager>,
    keys: CacheKeyGenerator,
    question_breaker: CircuitBreaker,
    explanation_breaker: CircuitBreaker,
    skill_tree_breaker: CircuitBreaker,
    config: ServiceConfig,
}

impl ResilientAiService {
    pub(crate) fn from_parts(
        primary: Arc<dyn AiGenerator>,
        fallback: Arc<FallbackService>,
        cache: CacheManager,
        config: ServiceConfig,
    ) -> Self {
        let breaker = |op: Operation| CircuitBreaker::new(op.name(), config.policy(op).breaker.clone());
        Self {
            question_breaker: breaker(Operation::QuestionGeneration),
            explanation_breaker: breaker(Operation::Explanation),
            skill_tree_breaker: breaker(Operation::SkillTreeExpansion),
            primary,
            fallback,
            cache: Arc::new(cache),
            keys: CacheKeyGenerator::new(),
            config,
        }
    }

    pub async fn generate_question(&self, req: &QuestionRequest) -> QuizQuestion {
        let key = self.question_key(req);
        self.run(
            Operation::QuestionGeneration,
            &key,
            || async move {
                let question = self.primary.generate_question(req).await?;
                question.validate().map_err(|e| {
                    Error::service(ServiceErrorKind::InvalidResponse, e.to_string())
                })?;
                Ok(question)
            },
            || self.fallback.question(req),
        )
        .await
    }

    pub async fn generate_explanation(&self, req: &ExplanationRequest) -> String {
        let key = self.explanation_key(req);
        self.run(
            Operation::Explanation,
            &key,
            || self.primary.generate_explanation(req),
            || self.fallback.explanation(req),
        )
        .await
    }

    pub async fn expand_skill_tree(&self, req: &SkillTreeRequest) -> SkillTreeExpansion {
        let key = self.skill_tree_key(req);
        self.run(
            Operation::SkillTreeExpansion,
            &key,
            || self.primary.expand_skill_tree(req),
            || self.fallback.skill_tree(req),
        )
        .await
    }

    async fn run<T, P, PFut, FB>(&self, op: Operation, key: &CacheKey, primary: P, fallback: FB) -> T
    where
        T: Serialize + DeserializeOwned,
        P: FnMut() -> PFut,
        PFut: Future<Output = Result<T>>,
        FB: Fn() -> T,
    {
        match self.cache.get::<T>(key).await {
            Ok(Some(hit)) => {
                debug!(operation = %op, "cache hit");
                return hit;
            }
            Ok(None) => debug!(operation = %op, "cache miss"),
            Err(e) => warn!(operation = %op, error = %e, "cache lookup failed"),
        }

        let policy = self.config.policy(op);
        let outcome = self
            .breaker(op)
            .execute_with_fallback(
                || async move { policy.retry.run(primary).await.map(|v| (v, Source::Primary)) },
                || async { Ok((fallback(), Source::Fallback)) },
            )
            .await;

        match outcome {
            Ok((value, Source::Primary)) => {
                if let Err(e) = self.cache.set_with_ttl(key, &value, policy.cache_ttl).await {
                    warn!(operation = %op, error = %e, "failed to cache response");
                }
                value
            }
            Ok((value, Source::Fallback)) => value,
            Err(e) => {
                warn!(operation = %op, error = %e, "resilient call failed, serving fallback");
                fallback()
            }
        }
    }

    /// Synthetic question request sent straight to the primary generator.
    ///
    /// Bypasses cache and breakers; only the call timeout of the question policy applies.
    pub async fn health_check(&self) -> HealthReport {
        let probe = QuestionRequest::new("general", "health check", Difficulty::Beginner);
        let timeout = self.config.question.breaker.call_timeout;
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, self.primary.generate_question(&probe)).await {
            Ok(r) => r.map(|_| ()),
            Err(_) => Err(Error::service(
                ServiceErrorKind::Timeout,
                format!("health check timed out after {}ms", timeout.as_millis()),
            )),
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                debug!(generator = self.primary.name(), latency_ms, "health check passed");
                HealthReport {
                    generator: self.primary.name().to_string(),
                    healthy: true,
                    latency_ms,
                    error: None,
                    error_kind: None,
                }
            }
            Err(e) => {
                warn!(generator = self.primary.name(), error = %e, "health check failed");
                HealthReport {
                    generator: self.primary.name().to_string(),
                    healthy: false,
                    latency_ms,
                    error_kind: Some(e.kind()),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn breaker(&self, op: Operation) -> &CircuitBreaker {
        match op {
            Operation::QuestionGeneration => &self.question_breaker,
            Operation::Explanation => &self.explanation_breaker,
            Operation::SkillTreeExpansion => &self.skill_tree_breaker,
        }
    }

    pub fn breaker_stats(&self) -> Vec<(Operation, CircuitBreakerStats)> {
        Operation::ALL
            .iter()
            .map(|op| (*op, self.breaker(*op).stats()))
            .collect()
    }

    /// Force every breaker closed.
    pub fn reset_breakers(&self) {
        for op in Operation::ALL {
            self.breaker(op).force_close();
        }
        info!("all circuit breakers reset");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn question_key(&self, req: &QuestionRequest) -> CacheKey {
        self.keys.generate(Operation::QuestionGeneration.name(), &req.cache_fields())
    }

    pub fn explanation_key(&self, req: &ExplanationRequest) -> CacheKey {
        self.keys.generate(Operation::Explanation.name(), &req.cache_fields())
    }

    pub fn skill_tree_key(&self, req: &SkillTreeRequest) -> CacheKey {
        self.keys.generate(Operation::SkillTreeExpansion.name(), &req.cache_fields())
    }

    /// Drop one cached response. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        self.cache.invalidate(key).await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }

    pub fn fallback(&self) -> &FallbackService {
        &self.fallback
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Spawn the periodic cache sweep. Must be called from within a tokio runtime.
    pub fn start_maintenance(&self) -> MaintenanceHandle {
        let token = CancellationToken::new();
        let handle = self.cache.clone().spawn_sweeper(token.clone());
        info!(
            every_ms = self.config.cache.sweep_interval.as_millis() as u64,
            "cache maintenance started"
        );
        MaintenanceHandle::new(token, handle)
    }
}
