//! # Response Caching Module
//!
//! Time-bounded memoization of AI responses keyed by request parameters.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Typed get/set with per-entry TTL, statistics and a background sweeper |
//! | [`CacheConfig`] | Capacity, default TTL and sweep interval |
//! | [`CacheBackend`] | Trait for implementing custom cache backends |
//! | [`MemoryCache`] | In-memory LRU-bounded TTL cache |
//! | [`NullCache`] | No-op cache for disabling caching |
//! | [`CacheKeyGenerator`] | Stable keys from an operation name and its request fields |
//!
//! ## Example
//!
//! ```rust
//! use skilltree_ai::cache::{CacheConfig, CacheKeyGenerator, CacheManager};
//! use std::time::Duration;
//!
//! # async fn demo() -> skilltree_ai::Result<()> {
//! let cache = CacheManager::from_config(CacheConfig::new().with_max_entries(500));
//! let key = CacheKeyGenerator::new().generate("explanation", &[("topic", "ownership".into())]);
//! cache.set_with_ttl(&key, &"Each value has one owner.", Duration::from_secs(600)).await?;
//! let hit: Option<String> = cache.get(&key).await?;
//! assert!(hit.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Entries are never persisted; a restart starts cold.

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyGenerator};
pub use manager::{CacheConfig, CacheManager, CacheStats};
