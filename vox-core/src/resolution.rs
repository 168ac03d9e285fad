//! Outcome of a configuration resolution

use crate::AgentConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where a resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Fetched from the control plane on this call.
    Api,
    /// Served from the cache, fresh or stale.
    Cache,
    /// The built-in fallback configuration.
    Default,
    /// Nothing was resolved.
    None,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Api => "api",
            ConfigSource::Cache => "cache",
            ConfigSource::Default => "default",
            ConfigSource::None => "none",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving an agent's configuration.
///
/// Callers should treat `success` as the norm and watch `source`:
/// [`ConfigSource::Default`] means "degraded but operational".
///
/// Results built with [`Self::from_api`], [`Self::from_cache`],
/// [`Self::from_default`] or [`Self::failure`] satisfy: `cache_hit` is true
/// exactly when `source` is [`ConfigSource::Cache`], and
/// [`ConfigSource::None`] only appears on failures. The fields are public
/// for reading and serialization; a result assembled field by field carries
/// no such guarantee, so build results through the constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub success: bool,
    pub config: Option<AgentConfig>,
    pub source: ConfigSource,
    pub cache_hit: bool,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ResolutionResult {
    pub fn from_api(config: AgentConfig, duration: Duration) -> Self {
        Self {
            success: true,
            config: Some(config),
            source: ConfigSource::Api,
            cache_hit: false,
            duration,
            error: None,
        }
    }

    /// Served from cache. Stale fallbacks use this constructor too.
    pub fn from_cache(config: AgentConfig, duration: Duration) -> Self {
        Self {
            success: true,
            config: Some(config),
            source: ConfigSource::Cache,
            cache_hit: true,
            duration,
            error: None,
        }
    }

    pub fn from_default(config: AgentConfig, duration: Duration) -> Self {
        Self {
            success: true,
            config: Some(config),
            source: ConfigSource::Default,
            cache_hit: false,
            duration,
            error: None,
        }
    }

    /// A failed resolution. Only input-contract violations end up here.
    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            config: None,
            source: ConfigSource::None,
            cache_hit: false,
            duration,
            error: Some(error.into()),
        }
    }

    /// Elapsed resolution time in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Whether the caller got the built-in fallback.
    pub fn is_degraded(&self) -> bool {
        self.source == ConfigSource::Default
    }

    /// Consume the result, returning the configuration if one was resolved.
    pub fn into_config(self) -> Option<AgentConfig> {
        self.config
    }
}
