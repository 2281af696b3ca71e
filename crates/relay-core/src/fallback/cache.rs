//! Cached-response fallback store
//!
//! Content-addressed lookup of previously generated good responses.
//! The hot path is a bounded in-memory LRU; a pluggable [`CacheStore`]
//! gives durability across restarts.

use crate::error::{RelayError, RelayResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One durable cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    /// The previously generated good response
    pub response: String,
    /// Intent the response answered
    pub intent: String,
    /// When the entry was created
    pub cached_at: DateTime<Utc>,
    /// Length of the input that produced it
    pub input_length: usize,
}

impl CachedEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        let age = Utc::now() - self.cached_at;
        age.to_std().map(|age| age > ttl).unwrap_or(false)
    }
}

/// Durable key/value persistence behind the response cache
///
/// The core only needs get/put/expire plus a warm-start scan; anything
/// with those semantics can sit behind this trait.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> RelayResult<Option<CachedEntry>>;
    async fn put(&self, key: &str, entry: CachedEntry) -> RelayResult<()>;
    /// Remove entries created before `cutoff`, returning how many went
    async fn expire(&self, cutoff: DateTime<Utc>) -> RelayResult<usize>;
    /// Read every entry, for warming the in-memory layer at startup
    async fn load_all(&self) -> RelayResult<HashMap<String, CachedEntry>>;
}

/// In-memory store, for tests and cache-without-durability setups
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> RelayResult<Option<CachedEntry>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CachedEntry) -> RelayResult<()> {
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn expire(&self, cutoff: DateTime<Utc>) -> RelayResult<usize> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.cached_at >= cutoff);
        Ok(before - entries.len())
    }

    async fn load_all(&self) -> RelayResult<HashMap<String, CachedEntry>> {
        Ok(self.entries.lock().clone())
    }
}

/// JSON-file store that batches writes
///
/// Keeps the full map in memory and rewrites the file every
/// `flush_every` mutations (and on `expire`), matching the periodic
/// flush behavior the fallback cache expects.
pub struct JsonFileStore {
    path: PathBuf,
    entries: tokio::sync::Mutex<HashMap<String, CachedEntry>>,
    flush_every: usize,
    dirty: std::sync::atomic::AtomicUsize,
}

impl JsonFileStore {
    /// Open (or create) the store at `path`
    pub async fn open(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "response cache file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
            flush_every: 10,
            dirty: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    async fn write_file(&self, entries: &HashMap<String, CachedEntry>) -> RelayResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn maybe_flush(&self, entries: &HashMap<String, CachedEntry>) -> RelayResult<()> {
        use std::sync::atomic::Ordering;
        let dirty = self.dirty.fetch_add(1, Ordering::SeqCst) + 1;
        if dirty >= self.flush_every {
            self.dirty.store(0, Ordering::SeqCst);
            self.write_file(entries).await?;
            debug!(path = %self.path.display(), entries = entries.len(), "response cache flushed");
        }
        Ok(())
    }

    /// Force the current contents to disk
    pub async fn flush(&self) -> RelayResult<()> {
        let entries = self.entries.lock().await;
        self.write_file(&entries).await
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn get(&self, key: &str) -> RelayResult<Option<CachedEntry>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: CachedEntry) -> RelayResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), entry);
        let snapshot = entries.clone();
        drop(entries);
        self.maybe_flush(&snapshot).await
    }

    async fn expire(&self, cutoff: DateTime<Utc>) -> RelayResult<usize> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| e.cached_at >= cutoff);
        let removed = before - entries.len();
        let snapshot = entries.clone();
        drop(entries);
        self.write_file(&snapshot).await?;
        Ok(removed)
    }

    async fn load_all(&self) -> RelayResult<HashMap<String, CachedEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded, time-limited cache of good responses keyed by (text, intent)
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CachedEntry>>,
    store: Option<Arc<dyn CacheStore>>,
    ttl: Duration,
    stats: Mutex<CacheStats>,
}

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default in-memory capacity
const DEFAULT_CAPACITY: usize = 500;

impl ResponseCache {
    /// Memory-only cache with the default capacity and TTL
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Memory-only cache with explicit bounds
    pub fn with_capacity(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped above zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            store: None,
            ttl,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Cache backed by a durable store, warmed from its contents
    pub async fn with_store(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        let cache = Self {
            store: Some(store.clone()),
            ..Self::with_capacity(DEFAULT_CAPACITY, ttl)
        };

        match store.load_all().await {
            Ok(persisted) => {
                let mut entries = cache.entries.lock();
                for (key, entry) in persisted {
                    if !entry.is_expired(ttl) {
                        entries.put(key, entry);
                    }
                }
                debug!(entries = entries.len(), "response cache warmed from store");
            }
            Err(e) => warn!(error = %e, "response cache warm-up failed"),
        }
        cache
    }

    /// Content-addressed key: sha256 of the normalized text plus intent
    pub fn cache_key(text: &str, intent: &str) -> String {
        let normalized = text.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update(b":");
        hasher.update(intent.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a good response for (text, intent); expired entries miss
    pub fn get(&self, text: &str, intent: &str) -> Option<String> {
        let key = Self::cache_key(text, intent);
        let mut entries = self.entries.lock();

        let (response, expired) = match entries.get(&key) {
            Some(entry) if entry.is_expired(self.ttl) => (None, true),
            Some(entry) => (Some(entry.response.clone()), false),
            None => (None, false),
        };
        if expired {
            entries.pop(&key);
        }
        drop(entries);

        let mut stats = self.stats.lock();
        if response.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        response
    }

    /// Remember a good response for future fallback use
    pub async fn put(&self, text: &str, intent: &str, response: &str) -> RelayResult<()> {
        let key = Self::cache_key(text, intent);
        let entry = CachedEntry {
            response: response.to_string(),
            intent: intent.to_string(),
            cached_at: Utc::now(),
            input_length: text.len(),
        };

        self.entries.lock().put(key.clone(), entry.clone());

        if let Some(store) = &self.store {
            store.put(&key, entry).await?;
        }
        Ok(())
    }

    /// Remove expired entries from the durable store
    pub async fn expire_persisted(&self) -> RelayResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.ttl)
                .map_err(|e| RelayError::other(format!("ttl out of range: {}", e)))?;
        store.expire(cutoff).await
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.lock();
        stats.entries = self.entries.lock().len();
        stats
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
