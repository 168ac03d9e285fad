//! Worker configuration from the environment

use vox_core::{ResolverConfig, VoxResult};

use crate::telemetry::{LogFormat, TelemetryConfig, ENV_LOG_FORMAT};

pub const ENV_PRELOAD_AGENTS: &str = "VOX_PRELOAD_AGENTS";
pub const ENV_SERVICE_NAME: &str = "VOX_SERVICE_NAME";

/// Everything the worker process needs at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub resolver: ResolverConfig,
    /// Agents whose configuration is fetched before taking calls.
    pub preload_agents: Vec<String>,
    pub telemetry: TelemetryConfig,
}

impl WorkerConfig {
    /// Load from environment variables.
    ///
    /// On top of the resolver variables:
    /// - `VOX_PRELOAD_AGENTS` (comma-separated agent ids, default: none)
    /// - `VOX_LOG_FORMAT` (`json` or `pretty`, default: json)
    /// - `VOX_SERVICE_NAME` (default: vox-worker)
    pub fn from_env() -> VoxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> VoxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolver = ResolverConfig::from_lookup(&lookup)?;

        let preload_agents = lookup(ENV_PRELOAD_AGENTS)
            .map(|raw| parse_agent_list(&raw))
            .unwrap_or_default();

        let mut telemetry = TelemetryConfig::default();
        if let Some(raw) = lookup(ENV_LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
            telemetry.log_format = raw.parse::<LogFormat>()?;
        }
        if let Some(name) = lookup(ENV_SERVICE_NAME).filter(|v| !v.trim().is_empty()) {
            telemetry.service_name = name.trim().to_string();
        }

        Ok(Self {
            resolver,
            preload_agents,
            telemetry,
        })
    }
}

/// Split a comma-separated id list, dropping blanks and duplicates.
fn parse_agent_list(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use vox_core::config::{ENV_BACKEND_URL, ENV_CACHE_TTL_SECS};
    use vox_core::VoxError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_env() {
        let config = WorkerConfig::from_lookup(lookup_from(&[(ENV_BACKEND_URL, "http://cp:3000")]))
            .unwrap();
        assert_eq!(config.resolver.backend_url, "http://cp:3000");
        assert!(config.preload_agents.is_empty());
        assert_eq!(config.telemetry, TelemetryConfig::default());
    }

    #[test]
    fn test_full_env() {
        let config = WorkerConfig::from_lookup(lookup_from(&[
            (ENV_BACKEND_URL, "http://cp:3000"),
            (ENV_CACHE_TTL_SECS, "30"),
            (ENV_PRELOAD_AGENTS, " sales , support,,sales "),
            (ENV_LOG_FORMAT, "pretty"),
            (ENV_SERVICE_NAME, "vox-worker-eu"),
        ]))
        .unwrap();

        assert_eq!(config.resolver.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.preload_agents, vec!["sales", "support"]);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(config.telemetry.service_name, "vox-worker-eu");
    }

    #[test]
    fn test_bad_log_format_is_error() {
        let err = WorkerConfig::from_lookup(lookup_from(&[
            (ENV_BACKEND_URL, "http://cp:3000"),
            (ENV_LOG_FORMAT, "xml"),
        ]))
        .unwrap_err();
        assert!(matches!(err, VoxError::Config(_)));
    }

    #[test]
    fn test_missing_backend_is_error() {
        assert!(WorkerConfig::from_lookup(lookup_from(&[])).is_err());
    }
}
