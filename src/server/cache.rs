//! In-memory LRU response cache with TTL.
//!
//! Keyed on a SHA-256 digest of the length-prefixed (language, code) pair, so
//! inputs containing any separator cannot alias each other.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;

use crate::protocol::DebugResponse;

/// Cache key for a (language, code) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(language: &str, code: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((language.len() as u64).to_le_bytes());
        hasher.update(language.as_bytes());
        hasher.update((code.len() as u64).to_le_bytes());
        hasher.update(code.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Short hex prefix for log lines.
    fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Response cache configuration.
pub struct ResponseCacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
}

struct CacheEntry {
    response: DebugResponse,
    inserted_at: Instant,
}

/// Capacity- and time-bounded cache of debug results.
pub struct ResponseCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// `capacity` is clamped to at least one entry.
    pub fn new(config: ResponseCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
        }
    }

    /// Look up a cached result. Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<DebugResponse> {
        let mut cache = self.inner.lock();
        let expired = match cache.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.response.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(key = %key.short(), "cache entry expired");
            cache.pop(key);
        }
        None
    }

    /// Store a result. When full, expired entries go first, then the least
    /// recently used one.
    pub fn put(&self, key: CacheKey, response: DebugResponse) {
        let mut cache = self.inner.lock();
        if cache.len() >= cache.cap().get() && !cache.contains(&key) {
            let ttl = self.ttl;
            let expired: Vec<CacheKey> = cache
                .iter()
                .filter(|(_, entry)| entry.inserted_at.elapsed() >= ttl)
                .map(|(k, _)| *k)
                .collect();
            for k in &expired {
                cache.pop(k);
            }
        }
        if let Some((evicted, _)) = cache.push(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        ) {
            if evicted != key {
                debug!(key = %evicted.short(), "evicted least recently used cache entry");
            }
        }
    }
}
