//! Translation Result Cache
//!
//! A bounded, memory-resident memoizer from a request fingerprint to a
//! prior successful [`TranslationResult`].
//!
//! # Policy
//!
//! - **TTL**: an entry older than `ttl_secs` is treated as absent. It is
//!   purged lazily when a `get` observes it, or eagerly by
//!   [`TranslationCache::purge_expired`].
//! - **Capacity**: when a new key would exceed `max_size`, expired entries
//!   are dropped first; if none are expired the least recently used entry
//!   is evicted.
//!
//! # Locking
//!
//! ```text
//! Mutex<LruCache>   entries; every read or write of an entry
//! CacheCounters     atomics; hits, misses, sizes, readable without the lock
//! ```
//!
//! Every operation that touches entries waits at most `lock_timeout_ms`
//! for the mutex. If it cannot be taken the operation is logged as a cache
//! error and degrades: `get` counts a request and a miss, `set` is dropped,
//! and the maintenance operations report that nothing was done. The cache
//! never fails a translation, and [`TranslationCache::stats`] never waits.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TranslationError;
use crate::translation::{CacheMetadata, TranslateRequest, TranslationResult};

/// Fixed per-entry overhead used by the memory estimate
const ENTRY_OVERHEAD_BYTES: usize = 100;

/// Characters of source text shown by [`TranslationCache::top_entries`]
const PREVIEW_CHARS: usize = 50;

// =============================================================================
// Configuration
// =============================================================================

/// Cache sizing and expiry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident entries
    pub max_size: usize,
    /// Seconds after creation at which an entry expires
    pub ttl_secs: u64,
    /// Longest wait for the cache lock
    pub lock_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            ttl_secs: 3600,
            lock_timeout_ms: 100,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Lock wait bound
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// =============================================================================
// Key
// =============================================================================

/// BLAKE3 fingerprint of every request field that affects the result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Fingerprint a request
    ///
    /// Fields are length-prefixed so that no two distinct requests hash the
    /// same byte stream.
    #[must_use]
    pub fn fingerprint(request: &TranslateRequest) -> Self {
        let mut hasher = blake3::Hasher::new();
        for field in [
            request.source_lang.as_str(),
            request.target_lang.as_str(),
            request.text.as_str(),
            request.context.as_str(),
            request.preference.as_str(),
        ] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Short hex form for logs
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

// =============================================================================
// Entries and Statistics
// =============================================================================

struct CacheEntry {
    result: TranslationResult,
    preview: String,
    created_at: Instant,
    last_accessed: Instant,
    access_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }

    fn estimated_bytes(&self) -> usize {
        ENTRY_OVERHEAD_BYTES
            + self.result.text.as_ref().map_or(0, String::len)
            + self.result.backend.as_ref().map_or(0, String::len)
            + self.result.method.as_str().len()
            + self.preview.len()
    }
}

type Entries = LruCache<CacheKey, CacheEntry>;

/// Counters kept beside the entry map
///
/// `resident` and `resident_bytes` change only while the entry lock is
/// held, so they always match the map once the lock is released.
#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    total_requests: AtomicU64,
    resident: AtomicUsize,
    resident_bytes: AtomicUsize,
}

impl CacheCounters {
    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn inserted(&self, entry: &CacheEntry) {
        self.resident.fetch_add(1, Ordering::Relaxed);
        self.resident_bytes
            .fetch_add(entry.estimated_bytes(), Ordering::Relaxed);
    }

    fn removed(&self, entry: &CacheEntry) {
        self.resident.fetch_sub(1, Ordering::Relaxed);
        self.resident_bytes
            .fetch_sub(entry.estimated_bytes(), Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.expirations,
            &self.total_requests,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.resident.store(0, Ordering::Relaxed);
        self.resident_bytes.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time cache statistics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that returned an entry
    pub hits: u64,
    /// Lookups that found nothing, an expired entry, or a busy cache
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Every lookup, hit or miss
    pub total_requests: u64,
    /// Resident entries
    pub current_size: usize,
    /// Rough resident size in bytes; for reporting only
    pub estimated_memory_bytes: usize,
    /// `hits / total_requests`, or 0 before the first lookup
    pub hit_rate: f64,
    /// Configured capacity
    pub max_size: usize,
    /// Configured TTL in seconds
    pub ttl_secs: u64,
}

/// Diagnostic view of one resident entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntrySummary {
    /// Leading characters of the source text
    pub preview: String,
    /// Backend that produced the result
    pub backend: Option<String>,
    /// Method tag of the result
    pub method: String,
    /// Hits on this entry
    pub access_count: u64,
    /// Seconds since creation
    pub age_secs: u64,
    /// Seconds since last hit (or creation)
    pub idle_secs: u64,
}

// =============================================================================
// Cache
// =============================================================================

/// Bounded TTL + LRU cache of translation results
pub struct TranslationCache {
    entries: Mutex<Entries>,
    counters: CacheCounters,
    config: CacheConfig,
}

impl TranslationCache {
    /// Create an empty cache
    ///
    /// A `max_size` of zero is raised to one.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            counters: CacheCounters::default(),
            config,
        }
    }

    /// Cache configuration
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a prior result for this request
    ///
    /// A hit refreshes the entry's recency and returns a copy annotated with
    /// [`CacheMetadata`].
    pub fn get(&self, request: &TranslateRequest) -> Option<TranslationResult> {
        self.get_at(request, Instant::now())
    }

    /// Store a successful result; failed results are ignored
    pub fn set(&self, request: &TranslateRequest, result: &TranslationResult) {
        self.set_at(request, result, Instant::now());
    }

    fn get_at(&self, request: &TranslateRequest, now: Instant) -> Option<TranslationResult> {
        let key = CacheKey::fingerprint(request);
        let counters = &self.counters;
        CacheCounters::inc(&counters.total_requests);

        let Some(mut entries) = self.lock("get") else {
            CacheCounters::inc(&counters.misses);
            return None;
        };

        let expired = match entries.peek(&key) {
            None => {
                CacheCounters::inc(&counters.misses);
                return None;
            }
            Some(entry) => entry.is_expired(self.config.ttl(), now),
        };

        if expired {
            if let Some(entry) = entries.pop(&key) {
                counters.removed(&entry);
            }
            CacheCounters::inc(&counters.expirations);
            CacheCounters::inc(&counters.misses);
            debug!(key = %key.short(), "Cache entry expired");
            return None;
        }

        let Some(entry) = entries.get_mut(&key) else {
            CacheCounters::inc(&counters.misses);
            return None;
        };
        entry.last_accessed = now;
        entry.access_count += 1;
        let metadata = CacheMetadata {
            age_ms: u64::try_from(now.saturating_duration_since(entry.created_at).as_millis())
                .unwrap_or(u64::MAX),
            access_count: entry.access_count,
        };
        let result = entry.result.with_cache_metadata(metadata);
        CacheCounters::inc(&counters.hits);
        debug!(key = %key.short(), "Cache hit");
        Some(result)
    }

    fn set_at(&self, request: &TranslateRequest, result: &TranslationResult, now: Instant) {
        if !result.is_success() {
            return;
        }
        let key = CacheKey::fingerprint(request);
        let Some(mut entries) = self.lock("set") else {
            return;
        };

        if !entries.contains(&key) && entries.len() >= entries.cap().get() {
            let purged = self.drop_expired(&mut entries, now);
            if purged == 0 {
                if let Some((evicted, entry)) = entries.pop_lru() {
                    self.counters.removed(&entry);
                    CacheCounters::inc(&self.counters.evictions);
                    debug!(key = %evicted.short(), "Evicted least recently used cache entry");
                }
            }
        }

        let entry = CacheEntry {
            result: TranslationResult {
                cache: None,
                ..result.clone()
            },
            preview: request.text.chars().take(PREVIEW_CHARS).collect(),
            created_at: now,
            last_accessed: now,
            access_count: 0,
        };
        self.counters.inserted(&entry);
        if let Some(replaced) = entries.put(key, entry) {
            self.counters.removed(&replaced);
        }
    }

    /// Remove every entry and reset the counters
    ///
    /// Returns `false` if the cache stayed busy past the lock timeout and
    /// nothing was cleared.
    pub fn clear(&self) -> bool {
        let Some(mut entries) = self.lock("clear") else {
            return false;
        };
        entries.clear();
        self.counters.reset();
        true
    }

    /// Eagerly drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let Some(mut entries) = self.lock("purge") else {
            return 0;
        };
        let purged = self.drop_expired(&mut entries, now);
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    fn drop_expired(&self, entries: &mut Entries, now: Instant) -> usize {
        let ttl = self.config.ttl();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl, now))
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            if let Some(entry) = entries.pop(key) {
                self.counters.removed(&entry);
            }
        }
        self.counters
            .expirations
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired.len()
    }

    /// Resident entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.resident.load(Ordering::Relaxed)
    }

    /// Whether no entries are resident
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current statistics, read without taking the entry lock
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let counters = &self.counters;
        let hits = counters.hits.load(Ordering::Relaxed);
        let total_requests = counters.total_requests.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hits as f64 / total_requests as f64
        };

        CacheStats {
            hits,
            misses: counters.misses.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            expirations: counters.expirations.load(Ordering::Relaxed),
            total_requests,
            current_size: counters.resident.load(Ordering::Relaxed),
            estimated_memory_bytes: counters.resident_bytes.load(Ordering::Relaxed),
            hit_rate,
            max_size: self.config.max_size,
            ttl_secs: self.config.ttl_secs,
        }
    }

    /// The `n` most frequently hit entries, most hit first
    ///
    /// Empty if the cache stayed busy past the lock timeout.
    #[must_use]
    pub fn top_entries(&self, n: usize) -> Vec<CacheEntrySummary> {
        let now = Instant::now();
        let Some(entries) = self.lock("top_entries") else {
            return Vec::new();
        };
        let mut summaries: Vec<CacheEntrySummary> = entries
            .iter()
            .map(|(_, entry)| CacheEntrySummary {
                preview: entry.preview.clone(),
                backend: entry.result.backend.clone(),
                method: entry.result.method.as_str().to_string(),
                access_count: entry.access_count,
                age_secs: now.saturating_duration_since(entry.created_at).as_secs(),
                idle_secs: now.saturating_duration_since(entry.last_accessed).as_secs(),
            })
            .collect();
        drop(entries);
        summaries.sort_by(|a, b| b.access_count.cmp(&a.access_count));
        summaries.truncate(n);
        summaries
    }

    fn lock(&self, operation: &'static str) -> Option<MutexGuard<'_, Entries>> {
        let guard = self.entries.try_lock_for(self.config.lock_timeout());
        if guard.is_none() {
            let err = TranslationError::cache(format!(
                "Cache lock not acquired within {}ms during {operation}",
                self.config.lock_timeout_ms
            ));
            warn!(error = %err, operation, "Cache unavailable, continuing without it");
        }
        guard
    }
}
