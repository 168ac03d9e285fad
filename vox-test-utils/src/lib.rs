//! VOX Test Utilities
//!
//! Shared test infrastructure for the VOX workspace:
//! - A scripted [`ConfigFetcher`] mock
//! - Proptest generators for configurations and ids
//! - Fixtures for common scenarios
//! - Assertions on resolution results

pub use vox_core::{
    AgentConfig, ConfigSource, FetchError, LlmProvider, ResolutionResult, ResolverConfig,
    SttProvider, TtsProvider, VoxResult,
};
pub use vox_storage::ConfigFetcher;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

// ============================================================================
// MOCK FETCHER
// ============================================================================

/// One scripted fetch outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Config(AgentConfig),
    NotFound,
    Error(FetchError),
}

/// Fetcher that replays scripted outcomes and records every call.
///
/// Queued replies are consumed in order; once the queue is empty every call
/// gets the fallback reply.
#[derive(Debug)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: ScriptedReply,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    shutdowns: AtomicUsize,
}

impl ScriptedFetcher {
    /// A fetcher that answers "not found" unless scripted otherwise.
    pub fn new() -> Self {
        Self::always(ScriptedReply::NotFound)
    }

    pub fn always(reply: ScriptedReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: reply,
            delay: None,
            calls: Mutex::new(Vec::new()),
            shutdowns: AtomicUsize::new(0),
        }
    }

    /// Always return `config`.
    pub fn returning(config: AgentConfig) -> Self {
        Self::always(ScriptedReply::Config(config))
    }

    /// Always fail with a transport error.
    pub fn failing() -> Self {
        Self::always(ScriptedReply::Error(FetchError::Transport {
            agent_id: "scripted".to_string(),
            reason: "connection refused".to_string(),
        }))
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for the next unscripted call.
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.push(reply);
        self
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every `(agent_id, campaign_id)` pair fetched so far, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> ScriptedReply {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        agent_id: &str,
        campaign_id: Option<&str>,
    ) -> VoxResult<Option<AgentConfig>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((agent_id.to_string(), campaign_id.map(str::to_string)));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply() {
            ScriptedReply::Config(config) => Ok(Some(config)),
            ScriptedReply::NotFound => Ok(None),
            ScriptedReply::Error(err) => Err(err.into()),
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for VOX types.

    use super::*;
    use proptest::prelude::*;

    /// Agent ids accepted by the resolver.
    pub fn arb_agent_id() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,23}"
    }

    /// Optional campaign ids. Campaigns may contain the key separator and
    /// whitespace, both of which are kept verbatim.
    pub fn arb_campaign_id() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z0-9 ][a-z0-9: _-]{0,15}")
    }

    pub fn arb_llm_provider() -> impl Strategy<Value = LlmProvider> {
        proptest::sample::select(LlmProvider::ALL)
    }

    pub fn arb_tts_provider() -> impl Strategy<Value = TtsProvider> {
        proptest::sample::select(TtsProvider::ALL)
    }

    pub fn arb_stt_provider() -> impl Strategy<Value = SttProvider> {
        proptest::sample::select(SttProvider::ALL)
    }

    pub fn arb_language() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("en".to_string()),
            Just("es".to_string()),
            Just("fr".to_string()),
            Just("de".to_string()),
            Just("pt-BR".to_string()),
            "[a-z]{2}",
        ]
    }

    /// A configuration that passes validation.
    pub fn arb_agent_config() -> impl Strategy<Value = AgentConfig> {
        (
            arb_agent_id(),
            "[A-Z][a-z]{1,11}",
            "[A-Za-z ,.]{1,80}",
            proptest::option::of("[a-z ]{1,30}"),
            arb_llm_provider(),
            0.0f64..=2.0,
            arb_tts_provider(),
            proptest::option::of("[a-z0-9-]{4,16}"),
            arb_stt_provider(),
            arb_language(),
        )
            .prop_map(
                |(
                    agent_id,
                    name,
                    system_prompt,
                    personality,
                    llm_provider,
                    temperature,
                    tts_provider,
                    tts_voice_id,
                    stt_provider,
                    stt_language,
                )| {
                    let mut config = AgentConfig::default_config();
                    config.agent_id = agent_id;
                    config.name = name;
                    config.system_prompt = system_prompt;
                    config.personality = personality;
                    config.llm_provider = llm_provider;
                    config.temperature = temperature;
                    config.tts_provider = tts_provider;
                    config.tts_voice_id = tts_voice_id;
                    config.stt_provider = stt_provider;
                    config.stt_language = stt_language;
                    config
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built configurations for common scenarios.

    use super::*;

    /// A plain configuration for `agent_id`.
    pub fn agent_config(agent_id: &str) -> AgentConfig {
        let mut config = AgentConfig::default_config();
        config.agent_id = agent_id.to_string();
        config.name = format!("Agent {agent_id}");
        config.system_prompt = "You are a friendly receptionist.".to_string();
        config
    }

    /// A configuration tailored to one campaign, with its own prompt and voice.
    pub fn campaign_config(agent_id: &str, campaign_id: &str) -> AgentConfig {
        let mut config = agent_config(agent_id);
        config.system_prompt = format!("You are calling on behalf of campaign {campaign_id}.");
        config.tts_voice_id = Some(format!("voice-{campaign_id}"));
        config.metadata = Some(serde_json::json!({ "campaign_id": campaign_id }));
        config
    }

    /// A configuration carrying every secret field.
    pub fn config_with_secrets(agent_id: &str) -> AgentConfig {
        let mut config = agent_config(agent_id);
        config.llm_api_key = Some("sk-llm-secret".to_string());
        config.tts_api_key = Some("tts-secret".to_string());
        config.stt_api_key = Some("stt-secret".to_string());
        config.livekit_api_key = Some("lk-key".to_string());
        config.livekit_api_secret = Some("lk-secret".to_string());
        config
    }

    /// Resolver settings pointing at a backend that is never contacted.
    pub fn resolver_config() -> ResolverConfig {
        ResolverConfig::new("http://control-plane.test")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on resolution results.

    use super::*;

    /// Assert a successful resolution from the given source.
    #[track_caller]
    pub fn assert_resolved_from(result: &ResolutionResult, source: ConfigSource) {
        assert!(result.success, "Expected success, got: {:?}", result.error);
        assert_eq!(result.source, source, "Wrong resolution source");
        assert_eq!(
            result.cache_hit,
            source == ConfigSource::Cache,
            "cache_hit must match source"
        );
        assert!(result.config.is_some(), "Successful result without config");
    }

    /// Assert the caller got the built-in default configuration.
    #[track_caller]
    pub fn assert_degraded(result: &ResolutionResult) {
        assert_resolved_from(result, ConfigSource::Default);
        let config = result.config.as_ref().map(|c| c.agent_id.as_str());
        assert_eq!(config, Some(vox_core::DEFAULT_AGENT_ID));
    }

    /// Assert an input-contract rejection.
    #[track_caller]
    pub fn assert_rejected(result: &ResolutionResult) {
        assert!(!result.success, "Expected rejection, got success");
        assert_eq!(result.source, ConfigSource::None);
        assert!(result.config.is_none());
        assert!(result.error.is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_scripted_fetcher_replays_in_order() {
        let fetcher = ScriptedFetcher::new()
            .then(ScriptedReply::Config(fixtures::agent_config("a")))
            .then(ScriptedReply::Error(FetchError::Timeout {
                agent_id: "a".to_string(),
                timeout: Duration::from_secs(5),
            }));

        assert!(fetcher.fetch("a", None).await.unwrap().is_some());
        assert!(fetcher.fetch("a", Some("c")).await.is_err());
        assert!(fetcher.fetch("a", None).await.unwrap().is_none());

        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(fetcher.calls()[1], ("a".to_string(), Some("c".to_string())));
    }

    #[tokio::test]
    async fn test_scripted_fetcher_counts_shutdowns() {
        let fetcher = ScriptedFetcher::failing();
        fetcher.shutdown().await;
        fetcher.shutdown().await;
        assert_eq!(fetcher.shutdown_count(), 2);
    }

    #[tokio::test]
    async fn test_resolver_forwards_campaign_verbatim() {
        let resolver = vox_storage::ConfigResolver::new(
            ScriptedFetcher::returning(fixtures::agent_config("a")),
            &fixtures::resolver_config(),
        );

        resolver.resolve("a", Some(" x")).await;
        resolver.resolve("a", Some("x")).await;

        assert_eq!(
            resolver.fetcher().calls(),
            vec![
                ("a".to_string(), Some(" x".to_string())),
                ("a".to_string(), Some("x".to_string())),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_campaign_reaches_fetcher_unchanged(
            agent in generators::arb_agent_id(),
            campaign in generators::arb_campaign_id(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let calls = runtime.block_on(async {
                let resolver = vox_storage::ConfigResolver::new(
                    ScriptedFetcher::returning(fixtures::agent_config(&agent)),
                    &fixtures::resolver_config(),
                );
                resolver.resolve(&agent, campaign.as_deref()).await;
                resolver.fetcher().calls()
            });
            prop_assert_eq!(calls, vec![(agent, campaign)]);
        }

        #[test]
        fn prop_generated_configs_validate(config in generators::arb_agent_config()) {
            prop_assert!(config.validate().is_ok());
        }
    }
}
