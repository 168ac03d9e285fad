//! Per-call session preparation
//!
//! Turns dispatched job metadata into everything a voice session needs:
//! the resolved configuration, agent instructions, provider descriptors and
//! the opening greeting.

use serde::{Deserialize, Serialize};
use vox_core::{AgentConfig, ConfigSource, ProviderHandle, DEFAULT_AGENT_ID};
use vox_storage::{ConfigFetcher, ConfigResolver};

use crate::error::{WorkerError, WorkerResult};

/// Direction of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Inbound,
    Outbound,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Metadata attached to a dispatched job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub agent_id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub call_type: CallType,
}

/// Wire shape of the metadata, where every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawJobMetadata {
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    call_type: CallType,
}

impl JobMetadata {
    /// Parse the job's JSON metadata.
    ///
    /// Never fails: unparsable metadata is logged and treated as empty, and
    /// a missing agent id falls back to the default agent. The agent id is
    /// trimmed; the campaign id is kept as sent, with `""` meaning none.
    pub fn parse(raw: Option<&str>) -> Self {
        let parsed = match raw.map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => serde_json::from_str::<RawJobMetadata>(raw).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to parse job metadata");
                RawJobMetadata::default()
            }),
            None => RawJobMetadata::default(),
        };

        let agent_id = match non_blank(parsed.agent_id) {
            Some(id) => id,
            None => {
                tracing::error!("No agent_id in job metadata, using the default agent");
                DEFAULT_AGENT_ID.to_string()
            }
        };

        Self {
            agent_id,
            campaign_id: parsed.campaign_id.filter(|c| !c.is_empty()),
            phone_number: non_blank(parsed.phone_number),
            call_type: parsed.call_type,
        }
    }

    /// Inbound calls, and calls with no number to dial, open with a greeting.
    pub fn greets_caller(&self) -> bool {
        self.call_type == CallType::Inbound || self.phone_number.is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Everything needed to start a voice session for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPlan {
    pub agent_id: String,
    pub campaign_id: Option<String>,
    pub call_type: CallType,
    /// Where the configuration came from.
    pub source: ConfigSource,
    #[serde(skip)]
    pub config: AgentConfig,
    pub instructions: String,
    pub llm: ProviderHandle,
    pub temperature: f64,
    pub tts: ProviderHandle,
    pub stt: ProviderHandle,
    /// Spoken first on inbound calls; outbound calls wait for the callee.
    pub greeting: Option<String>,
    pub resolution_ms: u64,
}

impl SessionPlan {
    /// Resolve the agent's configuration and derive the session settings.
    ///
    /// Fails only if the resolver rejects the metadata outright.
    pub async fn prepare<F: ConfigFetcher>(
        resolver: &ConfigResolver<F>,
        metadata: &JobMetadata,
    ) -> WorkerResult<Self> {
        let result = resolver
            .resolve(&metadata.agent_id, metadata.campaign_id.as_deref())
            .await;
        let source = result.source;
        let resolution_ms = result.duration_ms();

        let config = match (result.success, result.config) {
            (true, Some(config)) => config,
            (_, _) => {
                return Err(WorkerError::Resolution {
                    agent_id: metadata.agent_id.clone(),
                    reason: result.error.unwrap_or_else(|| "no configuration".to_string()),
                })
            }
        };

        if source == ConfigSource::Default {
            tracing::warn!(
                agent_id = %metadata.agent_id,
                "Session running on the default configuration"
            );
        }
        tracing::debug!(
            agent_id = %metadata.agent_id,
            config = %config.redacted(),
            "Resolved session configuration"
        );

        let greeting = metadata.greets_caller().then(|| greeting_for(&config));
        let llm = config.llm();

        Ok(Self {
            agent_id: metadata.agent_id.clone(),
            campaign_id: metadata.campaign_id.clone(),
            call_type: metadata.call_type,
            source,
            instructions: config.instructions(),
            llm: llm.handle(),
            temperature: llm.temperature,
            tts: config.tts().handle(),
            stt: config.stt().handle(),
            greeting,
            resolution_ms,
            config,
        })
    }
}

/// Opening line for inbound calls.
pub fn greeting_for(config: &AgentConfig) -> String {
    format!("Hello! This is {}. How can I help you today?", config.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_test_utils::assertions::assert_resolved_from;
    use vox_test_utils::fixtures::{agent_config, campaign_config, resolver_config};
    use vox_test_utils::{ScriptedFetcher, ScriptedReply};

    #[test]
    fn test_parse_full_metadata() {
        let meta = JobMetadata::parse(Some(
            r#"{"agent_id":"sales","campaign_id":"q3","phone_number":"+15550100","call_type":"outbound"}"#,
        ));
        assert_eq!(meta.agent_id, "sales");
        assert_eq!(meta.campaign_id.as_deref(), Some("q3"));
        assert_eq!(meta.call_type, CallType::Outbound);
        assert!(!meta.greets_caller());
    }

    #[test]
    fn test_parse_missing_agent_falls_back_to_default() {
        let meta = JobMetadata::parse(Some(r#"{"call_type":"inbound"}"#));
        assert_eq!(meta.agent_id, DEFAULT_AGENT_ID);
        assert_eq!(meta.call_type, CallType::Inbound);

        assert_eq!(JobMetadata::parse(None).agent_id, DEFAULT_AGENT_ID);
        assert_eq!(JobMetadata::parse(Some("not json")).agent_id, DEFAULT_AGENT_ID);
    }

    #[test]
    fn test_campaign_kept_verbatim() {
        let meta = JobMetadata::parse(Some(r#"{"agent_id":" sales ","campaign_id":" q3"}"#));
        assert_eq!(meta.agent_id, "sales");
        assert_eq!(meta.campaign_id.as_deref(), Some(" q3"));

        let meta = JobMetadata::parse(Some(r#"{"agent_id":"sales","campaign_id":""}"#));
        assert_eq!(meta.campaign_id, None);
    }

    #[test]
    fn test_unknown_call_type() {
        let meta = JobMetadata::parse(Some(r#"{"agent_id":"a","call_type":"transfer"}"#));
        assert_eq!(meta.call_type, CallType::Unknown);
        assert!(meta.greets_caller());
    }

    #[tokio::test]
    async fn test_prepare_inbound_session() {
        let mut config = agent_config("support");
        config.name = "Maya".to_string();
        config.personality = Some("warm".to_string());
        let resolver = ConfigResolver::new(ScriptedFetcher::returning(config), &resolver_config());

        let meta = JobMetadata::parse(Some(r#"{"agent_id":"support","call_type":"inbound"}"#));
        let plan = SessionPlan::prepare(&resolver, &meta).await.unwrap();

        assert_eq!(plan.source, ConfigSource::Api);
        assert_eq!(
            plan.greeting.as_deref(),
            Some("Hello! This is Maya. How can I help you today?")
        );
        assert!(plan.instructions.ends_with("Personality: warm"));
        assert_eq!(plan.llm.descriptor, "openai/gpt-4o-mini");
        assert_eq!(plan.stt.descriptor, "assemblyai/universal-streaming:en");
    }

    #[tokio::test]
    async fn test_prepare_outbound_campaign_session() {
        let fetcher = ScriptedFetcher::new()
            .then(ScriptedReply::Config(campaign_config("sales", "q3")));
        let resolver = ConfigResolver::new(fetcher, &resolver_config());

        let meta = JobMetadata::parse(Some(
            r#"{"agent_id":"sales","campaign_id":"q3","phone_number":"+15550100","call_type":"outbound"}"#,
        ));
        let plan = SessionPlan::prepare(&resolver, &meta).await.unwrap();

        assert!(plan.greeting.is_none());
        assert_eq!(plan.campaign_id.as_deref(), Some("q3"));
        assert!(plan.instructions.contains("campaign q3"));
        assert_eq!(
            resolver.fetcher().calls(),
            vec![("sales".to_string(), Some("q3".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_prepare_degrades_to_default() {
        let resolver = ConfigResolver::new(ScriptedFetcher::failing(), &resolver_config());
        let meta = JobMetadata::parse(Some(r#"{"agent_id":"ghost"}"#));

        let plan = SessionPlan::prepare(&resolver, &meta).await.unwrap();
        assert_eq!(plan.source, ConfigSource::Default);
        assert_eq!(plan.config.agent_id, DEFAULT_AGENT_ID);
        assert_eq!(
            plan.greeting.as_deref(),
            Some("Hello! This is Default Agent. How can I help you today?")
        );
    }

    #[tokio::test]
    async fn test_prepare_rejects_invalid_agent() {
        let resolver = ConfigResolver::new(ScriptedFetcher::new(), &resolver_config());
        let meta = JobMetadata::parse(Some(r#"{"agent_id":"bad:id"}"#));

        let err = SessionPlan::prepare(&resolver, &meta).await.unwrap_err();
        assert!(matches!(err, WorkerError::Resolution { .. }));
        assert_eq!(resolver.fetcher().call_count(), 0);
    }

    #[tokio::test]
    async fn test_second_session_hits_cache() {
        let resolver = ConfigResolver::new(
            ScriptedFetcher::returning(agent_config("support")),
            &resolver_config(),
        );
        let meta = JobMetadata::parse(Some(r#"{"agent_id":"support"}"#));

        SessionPlan::prepare(&resolver, &meta).await.unwrap();
        let result = resolver.resolve("support", None).await;
        assert_resolved_from(&result, ConfigSource::Cache);
        assert_eq!(resolver.fetcher().call_count(), 1);
    }
}
