//! Configuration cache with explicit freshness.
//!
//! Callers state their staleness tolerance via [`Freshness`]. The
//! [`ConfigResolver`] reads with [`Freshness::WithinTtl`] first and only
//! falls back to [`Freshness::IgnoreTtl`] after the control plane failed.
//!
//! Expiry and eviction are lazy: expired entries stay in the map until they
//! are overwritten or evicted, and eviction happens only when a new key is
//! inserted into a full store. There is no background sweeper.
//!
//! # Example
//!
//! ```ignore
//! let resolver = ConfigResolver::new(client, &config);
//! let result = resolver.resolve("agent-1", Some("spring-campaign")).await;
//! if result.is_degraded() {
//!     tracing::warn!("running on the default configuration");
//! }
//! ```

pub mod freshness;
pub mod key;
pub mod metrics;
pub mod read_through;
pub mod store;
pub mod traits;

pub use freshness::{CachedConfig, Freshness};
pub use key::CacheKey;
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use read_through::ConfigResolver;
pub use store::ConfigStore;
pub use traits::{ConfigFetcher, StoreStats};
