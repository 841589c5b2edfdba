//! Cache backend implementations.

use super::key::CacheKey;
use crate::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &CacheKey) -> Result<bool>;
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    /// Drop every expired entry, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// In-memory TTL cache bounded by an LRU.
///
/// Inserting into a full cache evicts the least recently used entry in O(1).
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    /// `max_entries` of zero is treated as one.
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock();
        let now = Instant::now();
        match entries.get(&key.hash) {
            Some(entry) if entry.is_expired(now) => {
                entries.pop(&key.hash);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()> {
        self.lock()
            .put(key.hash.clone(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock().pop(&key.hash).is_some())
    }
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let entries = self.lock();
        Ok(entries
            .peek(&key.hash)
            .map(|e| !e.is_expired(Instant::now()))
            .unwrap_or(false))
    }
    async fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        let now = Instant::now();
        Ok(self.lock().iter().filter(|(_, e)| !e.is_expired(now)).count())
    }
    async fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.lock();
        let now = Instant::now();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &expired {
            entries.pop(k);
        }
        Ok(expired.len())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Backend used when caching is disabled.
pub struct NullCache;
impl NullCache {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn exists(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_expires_after_ttl() {
        let cache = MemoryCache::new(10);
        let key = CacheKey::new("k");
        cache.set(&key, b"v", Duration::from_millis(30)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(b"v".to_vec()));
        assert!(cache.exists(&key).await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert!(!cache.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_lru_bound() {
        let cache = MemoryCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.set(&"a".into(), b"1", ttl).await.unwrap();
        cache.set(&"b".into(), b"2", ttl).await.unwrap();
        // touch "a" so "b" is least recently used
        cache.get(&"a".into()).await.unwrap();
        cache.set(&"c".into(), b"3", ttl).await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 2);
        assert!(cache.exists(&"a".into()).await.unwrap());
        assert!(!cache.exists(&"b".into()).await.unwrap());
        assert!(cache.exists(&"c".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCache::new(10);
        cache.set(&"short".into(), b"x", Duration::from_millis(10)).await.unwrap();
        cache.set(&"long".into(), b"y", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.len().await.unwrap(), 1);
        assert!(cache.delete(&"long".into()).await.unwrap());
        assert!(!cache.delete(&"long".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_null_cache_stores_nothing() {
        let cache = NullCache::new();
        cache.set(&"k".into(), b"v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(cache.get(&"k".into()).await.unwrap(), None);
        assert_eq!(cache.name(), "null");
    }
}
