//! Bounded in-memory store of agent configurations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use vox_core::{AgentConfig, Clock, SystemClock};

use super::freshness::{CachedConfig, Freshness};
use super::key::CacheKey;
use super::traits::StoreStats;

/// TTL-aware configuration store with a hard capacity.
///
/// Expiry is checked on read and eviction happens on write; nothing runs in
/// the background. When a new key arrives at a full store, the entry with
/// the oldest `cached_at` is evicted (ties go to the smallest key).
///
/// All map access goes through one lock that is never held across an
/// `.await`. A poisoned lock is recovered, since every mutation leaves the
/// map consistent.
pub struct ConfigStore {
    entries: RwLock<HashMap<CacheKey, CachedConfig>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
    evictions: AtomicU64,
}

impl ConfigStore {
    /// Create a store backed by the system clock.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            clock,
            evictions: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CachedConfig>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CachedConfig>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a configuration.
    ///
    /// With [`Freshness::WithinTtl`] an expired entry reads as absent but is
    /// left in place so it can still serve as a stale fallback.
    pub fn get(&self, key: &CacheKey, freshness: Freshness) -> Option<AgentConfig> {
        let now = self.clock.now();
        let entries = self.read();
        entries
            .get(key)
            .filter(|entry| freshness.accepts(entry, now))
            .map(|entry| entry.config().clone())
    }

    /// Full entry for diagnostics, regardless of age.
    pub fn entry(&self, key: &CacheKey) -> Option<CachedConfig> {
        self.read().get(key).cloned()
    }

    /// Store a configuration, replacing any existing entry for `key`.
    ///
    /// Returns the key evicted to make room, if any. Eviction only happens
    /// when `key` is new and the store is full: overwriting an existing key
    /// keeps the size unchanged, so it never evicts another entry.
    pub fn put(&self, key: CacheKey, config: AgentConfig, ttl: Duration) -> Option<CacheKey> {
        let now = self.clock.now();
        let mut entries = self.write();

        let evicted = if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let victim = entries
                .iter()
                .min_by(|(ka, a), (kb, b)| a.cached_at().cmp(&b.cached_at()).then_with(|| ka.cmp(kb)))
                .map(|(k, _)| k.clone());
            if let Some(victim) = &victim {
                entries.remove(victim);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(evicted_key = %victim, capacity = self.capacity, "Evicted oldest cache entry");
            }
            victim
        } else {
            None
        };

        entries.insert(key.clone(), CachedConfig::new(config, key, now, ttl));
        evicted
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.write().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !key.as_str().starts_with(prefix));
        before - entries.len()
    }

    /// Remove the bare and every campaign-qualified entry of one agent.
    pub fn invalidate_agent(&self, agent_id: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !key.belongs_to(agent_id));
        before - entries.len()
    }

    /// Remove everything. Returns the number of entries dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.write();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Keys currently held, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            capacity: self.capacity,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("entries", &self.len())
            .field("capacity", &self.capacity)
            .field("evictions", &self.evictions.load(Ordering::Relaxed))
            .finish()
    }
}
