//! Downstream provider descriptors.
//!
//! The session machinery hands these opaque strings to its provider
//! adapters. Building one is a pure function of the selection: no network,
//! no environment mutation.

use crate::{LlmProvider, SttProvider, TtsProvider};
use serde::Serialize;

/// Descriptor handed to a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHandle {
    /// Opaque provider string, e.g. `assemblyai/universal-streaming:en`.
    pub descriptor: String,
    /// Whether the agent supplied its own credential for this provider.
    pub credential_override: bool,
}

/// LLM selection borrowed from an [`AgentConfig`](crate::AgentConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LlmSelection<'a> {
    pub provider: LlmProvider,
    pub model: &'a str,
    pub api_key: Option<&'a str>,
    pub temperature: f64,
}

/// TTS selection borrowed from an [`AgentConfig`](crate::AgentConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtsSelection<'a> {
    pub provider: TtsProvider,
    pub voice: Option<&'a str>,
    pub api_key: Option<&'a str>,
}

/// STT selection borrowed from an [`AgentConfig`](crate::AgentConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SttSelection<'a> {
    pub provider: SttProvider,
    pub model: Option<&'a str>,
    pub language: &'a str,
    pub api_key: Option<&'a str>,
}

const GROQ_MODELS: &[(&str, &str)] = &[
    ("mixtral-8x7b", "mixtral-8x7b-32768"),
    ("llama-3.1-70b", "llama-3.1-70b-versatile"),
    ("llama-3.1-8b", "llama-3.1-8b-instant"),
];

const AMAZON_MODELS: &[(&str, &str)] = &[
    ("claude-3-5-sonnet", "anthropic.claude-3-5-sonnet-20241022-v2:0"),
    ("claude-3-sonnet", "anthropic.claude-3-sonnet-20240229-v1:0"),
    ("claude-3-haiku", "anthropic.claude-3-haiku-20240307-v1:0"),
];

const ASSEMBLYAI_MODELS: &[(&str, &str)] = &[
    ("universal", "universal-streaming"),
    ("best", "best-streaming"),
    ("nano", "nano-streaming"),
];

const CARTESIA_VOICES: &[(&str, &str)] = &[
    ("echo", "79a125e8-cd45-4c13-8a67-188112f4dd22"),
    ("alloy", "bf991597-6c13-47e4-8411-91ec2de5c466"),
    ("shimmer", "69a82b6f-d26a-491e-9e00-bfb9250eea12"),
    ("barbershop-man", "a0e99841-438c-4a64-b679-ae501e7d6091"),
    ("friendly-reading-man", "f114a467-c40a-4db8-964d-aaba89cd08fa"),
    ("professional-woman", "77a36f9e-0246-45f5-8a3f-1e7e7e3d4b49"),
];

const LOCALES: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("es", "es-ES"),
    ("fr", "fr-FR"),
    ("de", "de-DE"),
    ("it", "it-IT"),
    ("pt", "pt-BR"),
    ("nl", "nl-NL"),
    ("pl", "pl-PL"),
    ("ru", "ru-RU"),
    ("ja", "ja-JP"),
    ("ko", "ko-KR"),
    ("zh", "zh-CN"),
    ("ar", "ar-SA"),
    ("hi", "hi-IN"),
];

/// Look up `name` in a static alias table, falling back to `name` itself.
fn alias<'a>(table: &'a [(&'a str, &'a str)], name: &'a str) -> &'a str {
    table
        .iter()
        .find(|(short, _)| *short == name)
        .map(|(_, full)| *full)
        .unwrap_or(name)
}

/// Convert a bare language code to a locale (`en` -> `en-US`).
///
/// Values that already carry a region are returned unchanged; unknown codes
/// get a `-US` suffix.
pub fn to_locale(language: &str) -> String {
    if language.contains('-') {
        return language.to_string();
    }
    let lower = language.to_ascii_lowercase();
    LOCALES
        .iter()
        .find(|(code, _)| *code == lower)
        .map(|(_, locale)| locale.to_string())
        .unwrap_or_else(|| format!("{}-US", language))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl LlmSelection<'_> {
    pub fn handle(&self) -> ProviderHandle {
        let model = match self.provider {
            LlmProvider::Groq => alias(GROQ_MODELS, self.model),
            LlmProvider::Amazon => alias(AMAZON_MODELS, self.model),
            _ => self.model,
        };
        ProviderHandle {
            descriptor: format!("{}/{}", self.provider, model),
            credential_override: non_empty(self.api_key).is_some(),
        }
    }
}

impl TtsSelection<'_> {
    pub fn handle(&self) -> ProviderHandle {
        let voice = non_empty(self.voice);
        let descriptor = match self.provider {
            TtsProvider::Cartesia => format!(
                "cartesia/sonic-2:{}",
                alias(CARTESIA_VOICES, voice.unwrap_or("echo"))
            ),
            TtsProvider::OpenAi => format!("openai/tts-1:{}", voice.unwrap_or("alloy")),
            TtsProvider::ElevenLabs => {
                format!("elevenlabs:{}", voice.unwrap_or("21m00Tcm4TlvDq8ikWAM"))
            }
            TtsProvider::Deepgram => format!("deepgram/{}", voice.unwrap_or("aura-asteria-en")),
        };
        ProviderHandle {
            descriptor,
            credential_override: non_empty(self.api_key).is_some(),
        }
    }
}

impl SttSelection<'_> {
    pub fn handle(&self) -> ProviderHandle {
        let model = non_empty(self.model);
        let descriptor = match self.provider {
            SttProvider::AssemblyAi => format!(
                "assemblyai/{}:{}",
                alias(ASSEMBLYAI_MODELS, model.unwrap_or("universal")),
                self.language
            ),
            SttProvider::Deepgram => format!(
                "deepgram/{}:{}",
                model.unwrap_or("nova-2"),
                to_locale(self.language)
            ),
            // Whisper has a single streaming model.
            SttProvider::OpenAi => format!("openai/whisper-1:{}", self.language),
        };
        ProviderHandle {
            descriptor,
            credential_override: non_empty(self.api_key).is_some(),
        }
    }
}
