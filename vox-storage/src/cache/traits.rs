//! Fetcher trait and store statistics.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use vox_core::{AgentConfig, VoxResult};

/// Source of authoritative configurations, normally the control plane.
///
/// Outcomes:
/// - `Ok(Some(config))`: the backend returned a valid configuration
/// - `Ok(None)`: the backend has no configuration for this agent (404)
/// - `Err(_)`: timeout, transport error, bad status or malformed payload
///
/// Implementations must not retry internally and must not touch the store.
#[async_trait]
pub trait ConfigFetcher: Send + Sync + 'static {
    /// Fetch the configuration for an agent, optionally scoped to a campaign.
    async fn fetch(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> VoxResult<Option<AgentConfig>>;

    /// Release pooled connections. Must be idempotent.
    async fn shutdown(&self) {}
}

#[async_trait]
impl<F: ConfigFetcher + ?Sized> ConfigFetcher for Arc<F> {
    async fn fetch(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> VoxResult<Option<AgentConfig>> {
        (**self).fetch(agent_id, campaign_id).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }
}

/// Point-in-time statistics about the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of entries currently held, expired ones included.
    pub entries: usize,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Number of entries evicted due to capacity since creation.
    pub evictions: u64,
}

impl StoreStats {
    /// Fraction of capacity in use (0.0 to 1.0).
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entries as f64 / self.capacity as f64
        }
    }
}
