//! Configuration types

use crate::{ConfigError, VoxResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_BACKEND_URL: &str = "VOX_BACKEND_URL";
pub const ENV_CACHE_TTL_SECS: &str = "VOX_CONFIG_CACHE_TTL_SECS";
pub const ENV_CACHE_MAX_ENTRIES: &str = "VOX_CONFIG_CACHE_MAX_ENTRIES";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "VOX_CONFIG_REQUEST_TIMEOUT_SECS";

/// Settings for the configuration resolver and its control-plane client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Control-plane base URL, e.g. `http://localhost:3000`.
    pub backend_url: String,
    /// How long a fetched configuration counts as fresh.
    pub cache_ttl: Duration,
    /// Maximum number of cached configurations.
    pub max_cache_entries: usize,
    /// Bound on each control-plane request.
    pub request_timeout: Duration,
}

impl ResolverConfig {
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 1000;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a config for the given backend with default cache settings.
    ///
    /// A trailing `/` on the URL is dropped.
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url = backend_url.into();
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            max_cache_entries: Self::DEFAULT_MAX_CACHE_ENTRIES,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the maximum number of cache entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load from environment variables.
    ///
    /// - `VOX_BACKEND_URL` (required)
    /// - `VOX_CONFIG_CACHE_TTL_SECS` (default: 300)
    /// - `VOX_CONFIG_CACHE_MAX_ENTRIES` (default: 1000)
    /// - `VOX_CONFIG_REQUEST_TIMEOUT_SECS` (default: 5)
    ///
    /// Unparsable values are errors rather than silently defaulted.
    pub fn from_env() -> VoxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Backs [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> VoxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup(ENV_BACKEND_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: ENV_BACKEND_URL.to_string(),
            })?;

        let mut config = Self::new(backend_url.trim());

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<usize, _>(&lookup, ENV_CACHE_MAX_ENTRIES)? {
            config.max_cache_entries = max;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - backend_url is an http(s) URL with a host
    /// - cache_ttl is positive
    /// - max_cache_entries >= 1
    /// - request_timeout is positive
    pub fn validate(&self) -> VoxResult<()> {
        let url = self.backend_url.as_str();
        let rest = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"));
        match rest {
            Some(host) if !host.is_empty() && !host.starts_with('/') => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "backend_url".to_string(),
                    value: self.backend_url.clone(),
                    reason: "backend_url must be an http(s) URL".to_string(),
                }
                .into());
            }
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cache_ttl".to_string(),
                value: format!("{:?}", self.cache_ttl),
                reason: "cache_ttl must be positive".to_string(),
            }
            .into());
        }

        if self.max_cache_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_cache_entries".to_string(),
                value: self.max_cache_entries.to_string(),
                reason: "max_cache_entries must be at least 1".to_string(),
            }
            .into());
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: format!("{:?}", self.request_timeout),
                reason: "request_timeout must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: "not a valid non-negative integer".to_string(),
            }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
