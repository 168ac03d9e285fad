//! Agent runtime configuration record

use crate::descriptor::{LlmSelection, SttSelection, TtsSelection};
use crate::{LlmProvider, SttProvider, TtsProvider, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent id of the built-in fallback configuration.
pub const DEFAULT_AGENT_ID: &str = "default";

/// Placeholder written over secret values in log output.
pub const REDACTED: &str = "***REDACTED***";

const SECRET_FIELDS: [&str; 5] = [
    "llm_api_key",
    "tts_api_key",
    "stt_api_key",
    "livekit_api_key",
    "livekit_api_secret",
];

/// Complete runtime configuration for one agent.
///
/// Values arrive from the control-plane API as a snake_case JSON object;
/// absent optional fields take the defaults below. Provider selectors are
/// closed enums, so an unsupported provider fails deserialization.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    // Identity
    pub agent_id: String,
    pub name: String,
    #[serde(default = "default_livekit_agent_name")]
    pub livekit_agent_name: String,

    // Behaviour
    pub system_prompt: String,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    // LLM
    #[serde(default)]
    pub llm_provider: LlmProvider,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    // TTS
    #[serde(default)]
    pub tts_provider: TtsProvider,
    #[serde(default)]
    pub tts_voice_id: Option<String>,
    #[serde(default)]
    pub tts_api_key: Option<String>,

    // STT
    #[serde(default)]
    pub stt_provider: SttProvider,
    #[serde(default = "default_stt_language")]
    pub stt_language: String,
    #[serde(default)]
    pub stt_api_key: Option<String>,

    // Media server overrides
    #[serde(default)]
    pub livekit_url: Option<String>,
    #[serde(default)]
    pub livekit_api_key: Option<String>,
    #[serde(default)]
    pub livekit_api_secret: Option<String>,

    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: u32,

    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_livekit_agent_name() -> String {
    "core-voice-worker".to_string()
}

fn default_voice_id() -> String {
    "default".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_stt_language() -> String {
    "en".to_string()
}

fn default_max_concurrent_calls() -> u32 {
    3
}

impl AgentConfig {
    /// Inclusive temperature bounds accepted for the LLM.
    pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

    /// Deserialize and validate a configuration payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        let config: AgentConfig =
            serde_json::from_value(value).map_err(|e| ValidationError::Malformed {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in last-resort configuration.
    ///
    /// Built fresh on every call; it is never written to the cache.
    pub fn default_config() -> Self {
        Self {
            agent_id: DEFAULT_AGENT_ID.to_string(),
            name: "Default Agent".to_string(),
            livekit_agent_name: default_livekit_agent_name(),
            system_prompt:
                "You are a helpful AI assistant. Please assist the caller with their questions."
                    .to_string(),
            personality: Some("Professional and friendly".to_string()),
            voice_id: default_voice_id(),
            llm_provider: LlmProvider::OpenAi,
            llm_model: default_llm_model(),
            llm_api_key: None,
            temperature: default_temperature(),
            tts_provider: TtsProvider::Cartesia,
            tts_voice_id: None,
            tts_api_key: None,
            stt_provider: SttProvider::AssemblyAi,
            stt_language: default_stt_language(),
            stt_api_key: None,
            livekit_url: None,
            livekit_api_key: None,
            livekit_api_secret: None,
            max_concurrent_calls: default_max_concurrent_calls(),
            metadata: None,
        }
    }

    /// Validate field constraints that the type system does not cover.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.agent_id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "agent_id".to_string(),
            });
        }

        let (min, max) = Self::TEMPERATURE_RANGE;
        if !self.temperature.is_finite() || self.temperature < min || self.temperature > max {
            return Err(ValidationError::InvalidValue {
                field: "temperature".to_string(),
                reason: format!(
                    "{} is outside the range {:.1}..={:.1}",
                    self.temperature, min, max
                ),
            });
        }

        if self.max_concurrent_calls == 0 {
            return Err(ValidationError::InvalidValue {
                field: "max_concurrent_calls".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Whether this is the built-in fallback configuration.
    pub fn is_default(&self) -> bool {
        self.agent_id == DEFAULT_AGENT_ID
    }

    /// Agent instructions: the system prompt plus the personality, if any.
    pub fn instructions(&self) -> String {
        match self.personality.as_deref().map(str::trim) {
            Some(personality) if !personality.is_empty() => {
                format!("{}\n\nPersonality: {}", self.system_prompt, personality)
            }
            _ => self.system_prompt.clone(),
        }
    }

    pub fn llm(&self) -> LlmSelection<'_> {
        LlmSelection {
            provider: self.llm_provider,
            model: &self.llm_model,
            api_key: self.llm_api_key.as_deref(),
            temperature: self.temperature,
        }
    }

    /// TTS selection. An explicit `tts_voice_id` wins over `voice_id`; the
    /// placeholder voice `"default"` means "use the provider's default".
    pub fn tts(&self) -> TtsSelection<'_> {
        let voice = self
            .tts_voice_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                Some(self.voice_id.as_str()).filter(|v| !v.trim().is_empty() && *v != "default")
            });
        TtsSelection {
            provider: self.tts_provider,
            voice,
            api_key: self.tts_api_key.as_deref(),
        }
    }

    pub fn stt(&self) -> SttSelection<'_> {
        SttSelection {
            provider: self.stt_provider,
            model: None,
            language: &self.stt_language,
            api_key: self.stt_api_key.as_deref(),
        }
    }

    /// JSON view of the configuration with secrets replaced, for logging.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            for field in SECRET_FIELDS {
                if let Some(slot) = map.get_mut(field) {
                    if !slot.is_null() {
                        *slot = serde_json::Value::String(REDACTED.to_string());
                    }
                }
            }
        }
        value
    }
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "[REDACTED]")
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("agent_id", &self.agent_id)
            .field("name", &self.name)
            .field("livekit_agent_name", &self.livekit_agent_name)
            .field("system_prompt", &self.system_prompt)
            .field("personality", &self.personality)
            .field("voice_id", &self.voice_id)
            .field("llm_provider", &self.llm_provider)
            .field("llm_model", &self.llm_model)
            .field("llm_api_key", &redact(&self.llm_api_key))
            .field("temperature", &self.temperature)
            .field("tts_provider", &self.tts_provider)
            .field("tts_voice_id", &self.tts_voice_id)
            .field("tts_api_key", &redact(&self.tts_api_key))
            .field("stt_provider", &self.stt_provider)
            .field("stt_language", &self.stt_language)
            .field("stt_api_key", &redact(&self.stt_api_key))
            .field("livekit_url", &self.livekit_url)
            .field("livekit_api_key", &redact(&self.livekit_api_key))
            .field("livekit_api_secret", &redact(&self.livekit_api_secret))
            .field("max_concurrent_calls", &self.max_concurrent_calls)
            .field("metadata", &self.metadata)
            .finish()
    }
}
