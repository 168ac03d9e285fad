//! Provider selectors for the three voice pipeline subsystems.
//!
//! Each selector is a closed enum. Parsing is case-insensitive and rejects
//! unknown names, so an `AgentConfig` holding an unsupported provider cannot
//! be constructed through deserialization.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! provider_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $subsystem:literal, default = $default:ident,
        { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every supported provider, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of the provider.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parse a provider name, ignoring ASCII case and surrounding whitespace.
            pub fn parse(s: &str) -> Result<Self, ValidationError> {
                let normalized = s.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(ValidationError::UnsupportedProvider {
                        subsystem: $subsystem.to_string(),
                        provider: s.to_string(),
                        supported: Self::supported_names(),
                    }),
                }
            }

            /// Comma-separated list of supported provider names.
            pub fn supported_names() -> String {
                Self::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

provider_enum! {
    /// Language model provider.
    LlmProvider, "llm", default = OpenAi,
    {
        OpenAi => "openai",
        Cerebras => "cerebras",
        Groq => "groq",
        Google => "google",
        Amazon => "amazon",
    }
}

provider_enum! {
    /// Text-to-speech provider.
    TtsProvider, "tts", default = Cartesia,
    {
        Cartesia => "cartesia",
        OpenAi => "openai",
        ElevenLabs => "elevenlabs",
        Deepgram => "deepgram",
    }
}

provider_enum! {
    /// Speech-to-text provider.
    SttProvider, "stt", default = AssemblyAi,
    {
        AssemblyAi => "assemblyai",
        Deepgram => "deepgram",
        OpenAi => "openai",
    }
}
