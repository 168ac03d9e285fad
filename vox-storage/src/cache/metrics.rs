//! Resolver counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use super::traits::StoreStats;

/// Lock-free counters updated by the resolver.
///
/// Every resolved request increments exactly one of `cache_hits` or
/// `cache_misses`, so their sum always equals `total_requests`. Requests
/// rejected for bad input are counted separately.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    api_successes: AtomicU64,
    api_failures: AtomicU64,
    stale_fallbacks: AtomicU64,
    default_fallbacks: AtomicU64,
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_success(&self) {
        self.api_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_fallback(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_default_fallback(&self) {
        self.default_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters, combined with the store's current statistics.
    pub fn snapshot(&self, store: StoreStats) -> MetricsSnapshot {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let api_successes = self.api_successes.load(Ordering::Relaxed);
        let api_failures = self.api_failures.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            api_successes,
            api_failures,
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            default_fallbacks: self.default_fallbacks.load(Ordering::Relaxed),
            cache_hit_rate: ratio(cache_hits, cache_misses),
            api_success_rate: ratio(api_successes, api_failures),
            cache_fill_ratio: store.fill_ratio(),
            cache_size: store.entries,
            cache_capacity: store.capacity,
            evictions: store.evictions,
        }
    }
}

fn ratio(good: u64, bad: u64) -> f64 {
    let total = good + bad;
    if total == 0 {
        0.0
    } else {
        good as f64 / total as f64
    }
}

/// Point-in-time copy of the resolver counters.
///
/// Counters are read one at a time, so a snapshot taken under concurrent
/// load may be off by the requests in flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub api_successes: u64,
    pub api_failures: u64,
    pub stale_fallbacks: u64,
    pub default_fallbacks: u64,
    /// cache_hits / (cache_hits + cache_misses), 0 when nothing was resolved.
    pub cache_hit_rate: f64,
    /// api_successes / (api_successes + api_failures), 0 with no fetches.
    pub api_success_rate: f64,
    /// cache_size / cache_capacity.
    pub cache_fill_ratio: f64,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_rates_are_zero() {
        let snapshot = ResolverMetrics::new().snapshot(StoreStats::default());
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.cache_hit_rate, 0.0);
        assert_eq!(snapshot.api_success_rate, 0.0);
    }

    #[test]
    fn test_rates() {
        let metrics = ResolverMetrics::new();
        for _ in 0..3 {
            metrics.record_request();
            metrics.record_cache_hit();
        }
        metrics.record_request();
        metrics.record_cache_miss();
        metrics.record_api_failure();
        metrics.record_default_fallback();

        let snapshot = metrics.snapshot(StoreStats {
            entries: 2,
            capacity: 8,
            evictions: 1,
        });
        assert_eq!(snapshot.total_requests, 4);
        assert!((snapshot.cache_hit_rate - 0.75).abs() < f64::EPSILON);
        assert_eq!(snapshot.api_success_rate, 0.0);
        assert_eq!(snapshot.default_fallbacks, 1);
        assert_eq!(snapshot.cache_size, 2);
        assert_eq!(snapshot.cache_capacity, 8);
        assert!((snapshot.cache_fill_ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(snapshot.evictions, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = ResolverMetrics::new().snapshot(StoreStats::default());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["total_requests"], 0);
        assert!(json.get("cache_hit_rate").is_some());
    }
}
