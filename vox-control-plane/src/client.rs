//! Control-plane HTTP client

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use vox_core::{AgentConfig, ConfigError, FetchError, HealthCheck, ResolverConfig, VoxResult};
use vox_storage::ConfigFetcher;

use crate::types::RuntimeConfigResponse;

const COMPONENT: &str = "control-plane";

/// Client for the control-plane runtime-config API.
///
/// Each request is bounded by the configured timeout and never retried.
/// The pooled HTTP client is created on first use, dropped by
/// [`ControlPlaneClient::close`], and rebuilt lazily if used again.
pub struct ControlPlaneClient {
    base_url: Url,
    timeout: Duration,
    http: RwLock<Option<Client>>,
}

impl ControlPlaneClient {
    /// Create a client for the backend named in `config`.
    pub fn new(config: &ResolverConfig) -> VoxResult<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.backend_url).map_err(|e| ConfigError::InvalidValue {
            field: "backend_url".to_string(),
            value: config.backend_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "backend_url".to_string(),
                value: config.backend_url.clone(),
                reason: "backend_url cannot be used as a base URL".to_string(),
            }
            .into());
        }

        Ok(Self {
            base_url,
            timeout: config.request_timeout,
            http: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a pooled HTTP client is currently held.
    pub fn is_connected(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Get the pooled client, building it if needed.
    fn http(&self) -> Result<Client, reqwest::Error> {
        if let Some(client) = self
            .http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(client.clone());
        }

        let mut slot = self.http.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = Client::builder().timeout(self.timeout).build()?;
        *slot = Some(client.clone());
        tracing::debug!(base_url = %self.base_url, "Created control-plane HTTP client");
        Ok(client)
    }

    /// Append path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // The constructor rejects cannot-be-a-base URLs, so this always applies.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/api/v1/agents/{agent_id}/runtime-config[?campaignId=...]`
    ///
    /// The agent id is percent-encoded as a single path segment.
    pub fn runtime_config_url(&self, agent_id: &str, campaign_id: Option<&str>) -> Url {
        let mut url = self.endpoint(&["api", "v1", "agents", agent_id, "runtime-config"]);
        if let Some(campaign_id) = campaign_id.filter(|c| !c.is_empty()) {
            url.query_pairs_mut().append_pair("campaignId", campaign_id);
        }
        url
    }

    /// Fetch and validate one agent's runtime configuration.
    ///
    /// Returns `Ok(None)` when the backend answers 404.
    pub async fn fetch_runtime_config(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> VoxResult<Option<AgentConfig>> {
        match self.request_runtime_config(agent_id, campaign_id).await {
            Ok(Some(config)) => Ok(Some(config)),
            Ok(None) => {
                tracing::warn!(
                    agent_id = %agent_id,
                    campaign_id = campaign_id.unwrap_or(""),
                    "Agent configuration not found on control plane"
                );
                Ok(None)
            }
            Err(err) => {
                if err.is_contract_violation() {
                    tracing::warn!(agent_id = %agent_id, error = %err, "Control plane returned an unusable configuration");
                } else {
                    tracing::error!(agent_id = %agent_id, error = %err, "Control plane request failed");
                }
                Err(err.into())
            }
        }
    }

    async fn request_runtime_config(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> Result<Option<AgentConfig>, FetchError> {
        let url = self.runtime_config_url(agent_id, campaign_id);
        let client = self.http().map_err(|e| FetchError::Transport {
            agent_id: agent_id.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(agent_id = %agent_id, url = %url, "Fetching runtime config");

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(agent_id, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                agent_id: agent_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RuntimeConfigResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::MalformedResponse {
                    agent_id: agent_id.to_string(),
                    reason: e.to_string(),
                }
            } else {
                self.classify(agent_id, e)
            }
        })?;

        envelope.into_config(agent_id).map(Some)
    }

    fn classify(&self, agent_id: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                agent_id: agent_id.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Transport {
                agent_id: agent_id.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Probe `GET {base}/health`.
    ///
    /// 200 is healthy, any other status degraded, no answer unhealthy.
    pub async fn health_check(&self) -> HealthCheck {
        let started = Instant::now();
        let client = match self.http() {
            Ok(client) => client,
            Err(e) => return HealthCheck::unhealthy(COMPONENT, e.to_string()),
        };

        let check = match client.get(self.endpoint(&["health"])).send().await {
            Ok(response) if response.status() == StatusCode::OK => HealthCheck::healthy(COMPONENT),
            Ok(response) => HealthCheck::degraded(
                COMPONENT,
                format!("health endpoint returned {}", response.status().as_u16()),
            ),
            Err(e) => HealthCheck::unhealthy(COMPONENT, e.to_string()),
        };
        check.with_response_time(started.elapsed())
    }

    /// Drop the pooled client and its connections. Idempotent.
    pub fn close(&self) {
        let dropped = self
            .http
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if dropped.is_some() {
            tracing::info!(base_url = %self.base_url, "Closed control-plane HTTP client");
        }
    }
}

#[async_trait]
impl ConfigFetcher for ControlPlaneClient {
    async fn fetch(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> VoxResult<Option<AgentConfig>> {
        self.fetch_runtime_config(agent_id, campaign_id).await
    }

    async fn shutdown(&self) {
        self.close();
    }
}

impl std::fmt::Debug for ControlPlaneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ControlPlaneClient {
        ControlPlaneClient::new(&ResolverConfig::new(base)).unwrap()
    }

    #[test]
    fn test_runtime_config_url() {
        let c = client("http://localhost:3000/");
        assert_eq!(
            c.runtime_config_url("agent-1", None).as_str(),
            "http://localhost:3000/api/v1/agents/agent-1/runtime-config"
        );
        assert_eq!(
            c.runtime_config_url("agent-1", Some("spring sale")).as_str(),
            "http://localhost:3000/api/v1/agents/agent-1/runtime-config?campaignId=spring+sale"
        );
        assert_eq!(
            c.runtime_config_url("agent-1", Some("")).query(),
            None
        );
    }

    #[test]
    fn test_agent_id_is_one_segment() {
        let c = client("http://localhost:3000");
        let url = c.runtime_config_url("a/b?c", None);
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/v1/agents/a%2Fb%3Fc/runtime-config"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let c = client("https://cp.example.com/backend");
        assert_eq!(
            c.runtime_config_url("x", None).as_str(),
            "https://cp.example.com/backend/api/v1/agents/x/runtime-config"
        );
    }

    #[test]
    fn test_rejects_invalid_backend() {
        assert!(ControlPlaneClient::new(&ResolverConfig::new("ftp://host")).is_err());
    }

    #[test]
    fn test_close_is_idempotent_and_lazy_rebuild() {
        let c = client("http://localhost:3000");
        assert!(!c.is_connected());
        c.close();

        c.http().unwrap();
        assert!(c.is_connected());
        c.close();
        c.close();
        assert!(!c.is_connected());

        c.http().unwrap();
        assert!(c.is_connected());
    }

    #[test]
    fn test_debug_output() {
        let c = client("http://localhost:3000");
        let debug = format!("{c:?}");
        assert!(debug.contains("localhost:3000"));
        assert!(debug.contains("connected: false"));
    }
}
