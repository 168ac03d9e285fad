//! VOX Storage - Configuration Cache and Resolver
//!
//! A bounded, TTL-based in-memory store of agent configurations and the
//! read-through resolver that layers fallbacks on top of it:
//! fresh cache, then the control plane, then stale cache, then the
//! built-in default. The HTTP fetcher lives in `vox-control-plane`.

pub mod cache;

pub use cache::{
    CacheKey, CachedConfig, ConfigFetcher, ConfigResolver, ConfigStore, Freshness,
    MetricsSnapshot, ResolverMetrics, StoreStats,
};
