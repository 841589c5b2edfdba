//! Cache manager.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use super::backend::{CacheBackend, MemoryCache, NullCache};
use super::key::CacheKey;
use crate::config::duration_ms;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(rename = "default_ttl_ms", with = "duration_ms")]
    pub default_ttl: Duration,
    pub enabled: bool,
    pub max_entries: usize,
    pub max_entry_size: usize,
    #[serde(rename = "sweep_interval_ms", with = "duration_ms")]
    pub sweep_interval: Duration,
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self { Self { default_ttl: Duration::from_secs(300), enabled: true, max_entries: 1000, max_entry_size: 1024 * 1024, sweep_interval: Duration::from_secs(300), key_prefix: None } }
}

impl CacheConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.default_ttl = ttl; self }
    pub fn with_enabled(mut self, enabled: bool) -> Self { self.enabled = enabled; self }
    pub fn with_max_entries(mut self, n: usize) -> Self { self.max_entries = n; self }
    pub fn with_sweep_interval(mut self, every: Duration) -> Self { self.sweep_interval = every; self }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self { self.key_prefix = Some(prefix.into()); self }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats { pub hits: u64, pub misses: u64, pub sets: u64, pub deletes: u64, pub purged: u64, pub errors: u64 }

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 { let total = self.hits + self.misses; if total == 0 { 0.0 } else { self.hits as f64 / total as f64 } }
}

struct AtomicStats { hits: AtomicU64, misses: AtomicU64, sets: AtomicU64, deletes: AtomicU64, purged: AtomicU64, errors: AtomicU64 }
impl AtomicStats {
    fn new() -> Self { Self { hits: AtomicU64::new(0), misses: AtomicU64::new(0), sets: AtomicU64::new(0), deletes: AtomicU64::new(0), purged: AtomicU64::new(0), errors: AtomicU64::new(0) } }
    fn to_stats(&self) -> CacheStats { CacheStats { hits: self.hits.load(Ordering::Relaxed), misses: self.misses.load(Ordering::Relaxed), sets: self.sets.load(Ordering::Relaxed), deletes: self.deletes.load(Ordering::Relaxed), purged: self.purged.load(Ordering::Relaxed), errors: self.errors.load(Ordering::Relaxed) } }
}

/// Typed, JSON-encoded response cache over a [`CacheBackend`].
pub struct CacheManager { config: CacheConfig, backend: Box<dyn CacheBackend>, stats: Arc<AtomicStats> }

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self { Self { config, backend, stats: Arc::new(AtomicStats::new()) } }

    /// Bounded in-memory cache, or a no-op cache when disabled.
    pub fn from_config(config: CacheConfig) -> Self {
        let backend: Box<dyn CacheBackend> = if config.enabled { Box::new(MemoryCache::new(config.max_entries)) } else { Box::new(NullCache::new()) };
        Self::new(config, backend)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        if !self.config.enabled { return Ok(None); }
        let prefixed = self.prefix_key(key);
        match self.backend.get(&prefixed).await {
            Ok(Some(data)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                match serde_json::from_slice(&data) {
                    Ok(val) => Ok(Some(val)),
                    Err(_) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Ok(None) }
                }
            }
            Ok(None) => { self.stats.misses.fetch_add(1, Ordering::Relaxed); Ok(None) }
            Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> { self.set_with_ttl(key, value, self.config.default_ttl).await }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<()> {
        if !self.config.enabled { return Ok(()); }
        let data = serde_json::to_vec(value)?;
        if data.len() > self.config.max_entry_size { return Ok(()); }
        let prefixed = self.prefix_key(key);
        match self.backend.set(&prefixed, &data, ttl).await { Ok(()) => { self.stats.sets.fetch_add(1, Ordering::Relaxed); Ok(()) } Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) } }
    }

    /// Explicit invalidation of one entry.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        if !self.config.enabled { return Ok(false); }
        let prefixed = self.prefix_key(key);
        match self.backend.delete(&prefixed).await { Ok(d) => { if d { self.stats.deletes.fetch_add(1, Ordering::Relaxed); } Ok(d) } Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) } }
    }

    pub async fn clear(&self) -> Result<()> { self.backend.clear().await }

    pub async fn len(&self) -> Result<usize> { self.backend.len().await }

    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self.backend.purge_expired().await?;
        self.stats.purged.fetch_add(removed as u64, Ordering::Relaxed);
        Ok(removed)
    }

    /// Periodically purge expired entries until `token` is cancelled.
    pub fn spawn_sweeper(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let every = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(backend = self.backend_name(), "cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => match self.purge_expired().await {
                        Ok(0) => {}
                        Ok(n) => debug!(removed = n, "purged expired cache entries"),
                        Err(e) => warn!(error = %e, "cache sweep failed"),
                    },
                }
            }
        })
    }

    pub fn config(&self) -> &CacheConfig { &self.config }
    pub fn stats(&self) -> CacheStats { self.stats.to_stats() }
    pub fn backend_name(&self) -> &'static str { self.backend.name() }

    fn prefix_key(&self, key: &CacheKey) -> CacheKey {
        if let Some(ref p) = self.config.key_prefix { CacheKey::new(format!("{}:{}", p, key.hash)) } else { key.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_typed_roundtrip_and_stats() {
        let cache = CacheManager::from_config(CacheConfig::new().with_key_prefix("t"));
        let key = CacheKey::new("explain");
        assert_eq!(cache.get::<String>(&key).await.unwrap(), None);
        cache.set(&key, &"because".to_string()).await.unwrap();
        assert_eq!(cache.get::<String>(&key).await.unwrap().as_deref(), Some("because"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.hit_ratio(), 0.5);
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = CacheManager::from_config(CacheConfig::new());
        let key = CacheKey::new("q");
        cache.set_with_ttl(&key, &42u32, Duration::from_millis(30)).await.unwrap();
        assert_eq!(cache.get::<u32>(&key).await.unwrap(), Some(42));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get::<u32>(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let cache = CacheManager::from_config(CacheConfig::new().with_enabled(false));
        let key = CacheKey::new("q");
        cache.set(&key, &1u8).await.unwrap();
        assert_eq!(cache.get::<u8>(&key).await.unwrap(), None);
        assert_eq!(cache.backend_name(), "null");
    }

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let cache = Arc::new(CacheManager::from_config(
            CacheConfig::new().with_sweep_interval(Duration::from_millis(20)),
        ));
        cache.set_with_ttl(&"a".into(), &1u8, Duration::from_millis(5)).await.unwrap();
        cache.set_with_ttl(&"b".into(), &2u8, Duration::from_secs(60)).await.unwrap();

        let token = CancellationToken::new();
        let handle = cache.clone().spawn_sweeper(token.clone());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.stats().purged, 1);
        assert_eq!(cache.len().await.unwrap(), 1);

        token.cancel();
        handle.await.unwrap();
    }
}
