//! Read-through configuration resolver.
//!
//! Resolution order for one request:
//!
//! 1. fresh cache entry
//! 2. control-plane fetch (stored on success)
//! 3. stale cache entry, if the fetch failed or found nothing
//! 4. the built-in default configuration, never stored
//!
//! Only malformed input produces an unsuccessful [`ResolutionResult`]; every
//! backend failure degrades to one of the fallbacks instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use vox_core::{AgentConfig, Clock, FetchError, ResolutionResult, ResolverConfig, VoxResult};

use super::freshness::Freshness;
use super::key::CacheKey;
use super::metrics::{MetricsSnapshot, ResolverMetrics};
use super::store::ConfigStore;
use super::traits::ConfigFetcher;

/// Resolves agent configurations through the cache and a [`ConfigFetcher`].
///
/// Cheap to clone; clones share the store, fetcher and counters. Build one
/// at startup and hand clones to each session.
///
/// # Cancellation
///
/// The fetch and the store write that follows it run on a spawned task.
/// Dropping a `resolve` future mid-fetch does not cancel that task, so the
/// result still lands in the store for the next caller.
pub struct ConfigResolver<F: ConfigFetcher> {
    store: Arc<ConfigStore>,
    fetcher: Arc<F>,
    metrics: Arc<ResolverMetrics>,
    ttl: Duration,
}

impl<F: ConfigFetcher> Clone for ConfigResolver<F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            metrics: Arc::clone(&self.metrics),
            ttl: self.ttl,
        }
    }
}

impl<F: ConfigFetcher> ConfigResolver<F> {
    /// Create a resolver with a fresh store sized by `config`.
    pub fn new(fetcher: F, config: &ResolverConfig) -> Self {
        Self::from_parts(
            Arc::new(fetcher),
            Arc::new(ConfigStore::new(config.max_cache_entries)),
            config.cache_ttl,
        )
    }

    /// Like [`Self::new`], with an explicit time source for the store.
    pub fn with_clock(fetcher: F, config: &ResolverConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(
            Arc::new(fetcher),
            Arc::new(ConfigStore::with_clock(config.max_cache_entries, clock)),
            config.cache_ttl,
        )
    }

    pub fn from_parts(fetcher: Arc<F>, store: Arc<ConfigStore>, ttl: Duration) -> Self {
        Self {
            store,
            fetcher,
            metrics: Arc::new(ResolverMetrics::new()),
            ttl,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// TTL applied to newly fetched entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the configuration for an agent, optionally per campaign.
    ///
    /// Never fails for backend reasons: the result's `source` says whether
    /// the caller got live, cached or default data.
    pub async fn resolve(&self, agent_id: &str, campaign_id: Option<&str>) -> ResolutionResult {
        let started = Instant::now();

        let key = match CacheKey::new(agent_id, campaign_id) {
            Ok(key) => key,
            Err(e) => {
                self.metrics.record_rejected();
                tracing::warn!(agent_id = %agent_id, error = %e, "Rejected configuration request");
                return ResolutionResult::failure(e.to_string(), started.elapsed());
            }
        };

        self.metrics.record_request();

        if let Some(config) = self.store.get(&key, Freshness::WithinTtl) {
            self.metrics.record_cache_hit();
            tracing::debug!(
                agent_id = key.agent_id(),
                cache_key = %key,
                "Configuration served from cache"
            );
            return ResolutionResult::from_cache(config, started.elapsed());
        }

        self.metrics.record_cache_miss();

        let reason = match self.fetch_and_store(&key).await {
            Ok(Some(config)) => {
                tracing::info!(
                    agent_id = key.agent_id(),
                    cache_key = %key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Configuration fetched from control plane"
                );
                return ResolutionResult::from_api(config, started.elapsed());
            }
            Ok(None) => "no configuration on control plane".to_string(),
            Err(e) => e.to_string(),
        };

        if let Some(entry) = self.store.entry(&key) {
            self.metrics.record_stale_fallback();
            tracing::warn!(
                agent_id = key.agent_id(),
                cache_key = %key,
                age_secs = entry.age(self.store.now()).as_secs(),
                reason = %reason,
                "Serving stale configuration"
            );
            return ResolutionResult::from_cache(entry.into_config(), started.elapsed());
        }

        self.metrics.record_default_fallback();
        tracing::error!(
            agent_id = key.agent_id(),
            cache_key = %key,
            reason = %reason,
            "No configuration available, using default"
        );
        ResolutionResult::from_default(AgentConfig::default_config(), started.elapsed())
    }

    /// Run the fetch on its own task and store a successful result.
    ///
    /// API counters are recorded inside the task so they stay accurate when
    /// the caller goes away.
    async fn fetch_and_store(&self, key: &CacheKey) -> VoxResult<Option<AgentConfig>> {
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let metrics = Arc::clone(&self.metrics);
        let ttl = self.ttl;
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let outcome = fetcher
                .fetch(task_key.agent_id(), task_key.campaign_id())
                .await;
            match &outcome {
                Ok(Some(config)) => {
                    store.put(task_key, config.clone(), ttl);
                    metrics.record_api_success();
                }
                Ok(None) | Err(_) => metrics.record_api_failure(),
            }
            outcome
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                self.metrics.record_api_failure();
                Err(FetchError::Aborted {
                    agent_id: key.agent_id().to_string(),
                    reason: join_error.to_string(),
                }
                .into())
            }
        }
    }

    /// Resolve many agents concurrently to warm the cache.
    ///
    /// Each id is resolved without a campaign. Failures are isolated per id.
    /// Returns how many resolutions succeeded.
    pub async fn preload<I, S>(&self, agent_ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<String> = agent_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        if ids.is_empty() {
            return 0;
        }

        tracing::info!(count = ids.len(), "Preloading agent configurations");

        let results = join_all(ids.iter().map(|id| self.resolve(id, None))).await;

        let mut succeeded = 0;
        for (id, result) in ids.iter().zip(&results) {
            if result.success {
                succeeded += 1;
                tracing::debug!(agent_id = %id, source = %result.source, "Preloaded configuration");
            } else {
                tracing::warn!(
                    agent_id = %id,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Preload failed"
                );
            }
        }

        tracing::info!(succeeded, total = ids.len(), "Preload complete");
        succeeded
    }

    /// Drop every cached entry for an agent, across all campaigns.
    pub fn invalidate(&self, agent_id: &str) -> usize {
        let removed = self.store.invalidate_agent(agent_id);
        tracing::info!(agent_id = %agent_id, removed, "Invalidated cached configuration");
        removed
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        let removed = self.store.clear();
        tracing::info!(removed, "Cleared configuration cache");
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.store.stats())
    }

    /// Release the fetcher's resources. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.fetcher.shutdown().await;
        tracing::info!("Configuration resolver shut down");
    }
}

impl<F: ConfigFetcher> std::fmt::Debug for ConfigResolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("store", &self.store)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
