//! VOX Core - Agent Configuration Types
//!
//! Pure data structures shared by every other crate: the agent configuration
//! record, closed provider selectors, resolution results, resolver settings
//! and the error taxonomy. This crate performs no I/O.

pub mod agent;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod health;
pub mod providers;
pub mod resolution;

pub use agent::{AgentConfig, DEFAULT_AGENT_ID, REDACTED};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ResolverConfig;
pub use descriptor::{to_locale, LlmSelection, ProviderHandle, SttSelection, TtsSelection};
pub use error::{ConfigError, FetchError, ValidationError, VoxError, VoxResult};
pub use health::{HealthCheck, HealthStatus};
pub use providers::{LlmProvider, SttProvider, TtsProvider};
pub use resolution::{ConfigSource, ResolutionResult};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
