//! Embedding Cache for the query path
//!
//! Repeated questions are common in interactive use; caching their
//! embeddings skips the encoder entirely.
//!
//! # Cache Key Strategy
//!
//! Cache keys are SHA-256 hashes of `model_name + normalized text`, so:
//! - different models never share vectors
//! - texts differing only in whitespace share one entry
//! - keys are stable across restarts
//!
//! # Example
//!
//! ```ignore
//! use ragkit::rag::cache::CachedEmbedder;
//!
//! let embedder = Arc::new(CachedEmbedder::new(inner, 1024));
//! let v = embedder.embed_one("what is rust?").await?;   // miss
//! let w = embedder.embed_one("what is  rust?").await?;  // hit
//! assert_eq!(embedder.stats().hits, 1);
//! ```

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::embeddings::{prepare_inputs, Embedder};
use crate::types::{AppError, Result};

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries in cache
    pub entry_count: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Compute a cache key for a normalized text under a model.
pub fn compute_key(model: &str, normalized_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(normalized_text.as_bytes());
    hex::encode(hasher.finalize())
}

/// LRU-cached wrapper around any [`Embedder`].
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    /// Wrap `inner` with a cache of `capacity` entries (at least one).
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: cache.len(),
            capacity: cache.cap().get(),
        }
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs = prepare_inputs(texts)?;
        let model = self.inner.model_name();
        let keys: Vec<String> = inputs.iter().map(|t| compute_key(model, t)).collect();

        let mut found: Vec<Option<Vec<f32>>> = {
            let mut cache = self.cache.lock();
            keys.iter().map(|k| cache.get(k).cloned()).collect()
        };

        let missing: Vec<usize> = found
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i)
            .collect();

        self.hits
            .fetch_add((inputs.len() - missing.len()) as u64, Ordering::Relaxed);
        self.misses.fetch_add(missing.len() as u64, Ordering::Relaxed);

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| inputs[i].clone()).collect();
            let computed = self.inner.embed(&batch).await?;
            if computed.len() != batch.len() {
                return Err(AppError::Encoding(format!(
                    "embedder returned {} vectors for {} texts",
                    computed.len(),
                    batch.len()
                )));
            }

            let mut cache = self.cache.lock();
            for (&i, vector) in missing.iter().zip(computed) {
                cache.put(keys[i].clone(), vector.clone());
                found[i] = Some(vector);
            }
        }

        Ok(found.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::HashEmbedder;

    fn cached(capacity: usize) -> CachedEmbedder {
        CachedEmbedder::new(Arc::new(HashEmbedder::new(16).unwrap()), capacity)
    }

    #[test]
    fn test_cache_key_depends_on_model() {
        assert_eq!(compute_key("m", "hello"), compute_key("m", "hello"));
        assert_ne!(compute_key("m1", "hello"), compute_key("m2", "hello"));
        assert_eq!(compute_key("m", "hello").len(), 64);
    }

    #[tokio::test]
    async fn test_hits_and_misses() {
        let embedder = cached(8);

        let first = embedder.embed_one("what is rust").await.unwrap();
        let second = embedder.embed_one("  what is   rust ").await.unwrap();
        assert_eq!(first, second);

        let stats = embedder.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_order() {
        let embedder = cached(8);
        let plain = HashEmbedder::new(16).unwrap();

        embedder.embed_one("b").await.unwrap();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let out = embedder.embed(&texts).await.unwrap();
        let expected = plain.embed(&texts).await.unwrap();
        assert_eq!(out, expected);
        assert_eq!(embedder.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_eviction() {
        let embedder = cached(2);
        for text in ["one", "two", "three"] {
            embedder.embed_one(text).await.unwrap();
        }
        assert_eq!(embedder.stats().entry_count, 2);
        assert_eq!(embedder.stats().capacity, 2);

        embedder.clear();
        assert_eq!(embedder.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_cache() {
        let embedder = cached(2);
        let err = embedder.embed_one("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(embedder.stats().misses, 0);
    }
}
