//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub operation: Option<String>,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into(), operation: None }
    }
    pub fn with_operation(mut self, op: impl Into<String>) -> Self { self.operation = Some(op.into()); self }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.hash) }
}

impl From<&str> for CacheKey { fn from(s: &str) -> Self { Self::new(s) } }
impl From<String> for CacheKey { fn from(s: String) -> Self { Self::new(s) } }

/// Derives stable keys from an operation name plus the request fields that
/// determine its answer.
///
/// Field order never matters: parts are canonicalized through a sorted map
/// before hashing, so `{topic, difficulty}` and `{difficulty, topic}` collide.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    pub fn new() -> Self { Self }

    pub fn generate(&self, operation: &str, fields: &[(&str, String)]) -> CacheKey {
        let mut parts: BTreeMap<&str, &str> = BTreeMap::new();
        for (name, value) in fields {
            parts.insert(*name, value.as_str());
        }
        parts.insert("__op", operation);
        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        CacheKey::new(format!("{}:{}", operation, hash)).with_operation(operation)
    }
}
