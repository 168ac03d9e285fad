//! Freshness contracts for cache reads.
//!
//! Callers state whether an expired entry is acceptable. The resolver only
//! accepts expired data after the control plane failed to answer.

use chrono::{DateTime, Utc};
use std::time::Duration;
use vox_core::AgentConfig;

use super::key::CacheKey;

/// Staleness tolerance for a store read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Freshness {
    /// Only entries younger than their TTL are returned. Expired entries
    /// read as absent but stay in the store.
    #[default]
    WithinTtl,

    /// Any present entry is returned, however old.
    IgnoreTtl,
}

impl Freshness {
    pub fn ignores_ttl(&self) -> bool {
        matches!(self, Self::IgnoreTtl)
    }

    /// Whether an entry satisfies this requirement at `now`.
    pub fn accepts(&self, entry: &CachedConfig, now: DateTime<Utc>) -> bool {
        self.ignores_ttl() || !entry.is_expired(now)
    }
}

/// One cached configuration with the metadata needed to judge its age.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedConfig {
    config: AgentConfig,
    cached_at: DateTime<Utc>,
    cache_key: CacheKey,
    ttl: Duration,
}

impl CachedConfig {
    pub fn new(
        config: AgentConfig,
        cache_key: CacheKey,
        cached_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            config,
            cached_at,
            cache_key,
            ttl,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn into_config(self) -> AgentConfig {
        self.config
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time since the entry was stored. Zero if `now` is before `cached_at`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// True once the age is strictly greater than the TTL.
    ///
    /// An entry exactly `ttl` old is still fresh.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.cached_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => elapsed > ttl,
            // A TTL beyond chrono's range never runs out.
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cached_at: DateTime<Utc>, ttl_secs: u64) -> CachedConfig {
        let key = CacheKey::new("agent-1", None).unwrap();
        CachedConfig::new(
            AgentConfig::default_config(),
            key,
            cached_at,
            Duration::from_secs(ttl_secs),
        )
    }

    #[test]
    fn test_expiry_is_strictly_greater() {
        let t0 = Utc::now();
        let e = entry(t0, 1);

        assert!(!e.is_expired(t0));
        assert!(!e.is_expired(t0 + chrono::Duration::seconds(1)));
        assert!(e.is_expired(t0 + chrono::Duration::milliseconds(1001)));
    }

    #[test]
    fn test_age_clamps_to_zero() {
        let t0 = Utc::now();
        let e = entry(t0, 60);

        assert_eq!(e.age(t0 - chrono::Duration::seconds(5)), Duration::ZERO);
        assert_eq!(e.age(t0 + chrono::Duration::seconds(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_freshness_accepts() {
        let t0 = Utc::now();
        let e = entry(t0, 1);
        let later = t0 + chrono::Duration::seconds(2);

        assert!(Freshness::WithinTtl.accepts(&e, t0));
        assert!(!Freshness::WithinTtl.accepts(&e, later));
        assert!(Freshness::IgnoreTtl.accepts(&e, later));
    }

    #[test]
    fn test_default_respects_ttl() {
        assert_eq!(Freshness::default(), Freshness::WithinTtl);
        assert!(!Freshness::default().ignores_ttl());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let t0 = Utc::now();
        let key = CacheKey::new("agent-1", None).unwrap();
        let e = CachedConfig::new(AgentConfig::default_config(), key, t0, Duration::MAX);
        assert!(!e.is_expired(t0 + chrono::Duration::days(365 * 100)));
    }
}
