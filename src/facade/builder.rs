use super::generator::AiGenerator;
use super::service::ResilientAiService;
use crate::cache::{CacheBackend, CacheManager};
use crate::config::ServiceConfig;
use crate::fallback::{FallbackPool, FallbackService};
use crate::transport::HttpAiGenerator;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;

/// Builder for [`ResilientAiService`].
///
/// Everything except the primary generator has a default: built-in fallback
/// pool, in-memory cache sized from the config, and [`ServiceConfig::default`].
pub struct ResilientAiServiceBuilder {
    primary: Arc<dyn AiGenerator>,
    config: ServiceConfig,
    pool: Option<FallbackPool>,
    fallback: Option<Arc<FallbackService>>,
    backend: Option<Box<dyn CacheBackend>>,
}

impl ResilientAiServiceBuilder {
    pub fn new(primary: Arc<dyn AiGenerator>) -> Self {
        Self {
            primary,
            config: ServiceConfig::default(),
            pool: None,
            fallback: None,
            backend: None,
        }
    }

    /// Start from an HTTP generator described by `config.http`.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let http = config.http.clone().ok_or_else(|| {
            Error::configuration_with_context(
                "no HTTP generator configured",
                ErrorContext::new()
                    .with_field_path("http")
                    .with_details("set http.base_url or SKILLTREE_AI_BASE_URL"),
            )
        })?;
        let primary = Arc::new(HttpAiGenerator::new(&http)?);
        Ok(Self::new(primary).config(config))
    }

    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the built-in fallback question bank.
    pub fn fallback_pool(mut self, pool: FallbackPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Share an existing fallback service (and its rotation state).
    /// Takes precedence over [`fallback_pool`](Self::fallback_pool).
    pub fn fallback_service(mut self, fallback: Arc<FallbackService>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Custom cache backend. Ignored when caching is disabled in the config.
    pub fn cache_backend(mut self, backend: Box<dyn CacheBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<ResilientAiService> {
        self.config.validate()?;

        let cache = match self.backend {
            Some(backend) if self.config.cache.enabled => {
                CacheManager::new(self.config.cache.clone(), backend)
            }
            _ => CacheManager::from_config(self.config.cache.clone()),
        };
        let fallback = match self.fallback {
            Some(f) => f,
            None => Arc::new(FallbackService::new(
                self.pool.unwrap_or_default(),
                self.config.rotation.clone(),
            )),
        };
        Ok(ResilientAiService::from_parts(
            self.primary,
            fallback,
            cache,
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ExplanationRequest, QuestionRequest, QuizQuestion, SkillTreeExpansion, SkillTreeRequest,
    };
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl AiGenerator for Unused {
        fn name(&self) -> &str {
            "unused"
        }
        async fn generate_question(&self, _: &QuestionRequest) -> Result<QuizQuestion> {
            unreachable!()
        }
        async fn generate_explanation(&self, _: &ExplanationRequest) -> Result<String> {
            unreachable!()
        }
        async fn expand_skill_tree(&self, _: &SkillTreeRequest) -> Result<SkillTreeExpansion> {
            unreachable!()
        }
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = ServiceConfig::default();
        config.question.breaker.failure_threshold = 0;
        let err = ResilientAiServiceBuilder::new(Arc::new(Unused))
            .config(config)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_from_config_requires_http_section() {
        let err = ResilientAiServiceBuilder::from_config(ServiceConfig::default())
            .err()
            .unwrap();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("http")
        );
    }

    #[test]
    fn test_disabled_cache_ignores_backend() {
        let mut config = ServiceConfig::default();
        config.cache.enabled = false;
        let svc = ResilientAiServiceBuilder::new(Arc::new(Unused))
            .config(config)
            .cache_backend(Box::new(crate::cache::MemoryCache::new(10)))
            .build()
            .unwrap();
        assert_eq!(svc.cache_stats().sets, 0);
        assert_eq!(svc.fallback().pool().pool_size("rust"), 5);
    }
}
