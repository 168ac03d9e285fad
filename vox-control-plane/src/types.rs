//! Control-plane wire types

use serde::{Deserialize, Serialize};
use vox_core::{AgentConfig, FetchError};

/// Envelope returned by `GET /api/v1/agents/{id}/runtime-config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfigResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    /// Optional error message from the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuntimeConfigResponse {
    /// Unwrap the envelope into a validated configuration.
    pub fn into_config(self, agent_id: &str) -> Result<AgentConfig, FetchError> {
        if !self.success {
            return Err(FetchError::MalformedResponse {
                agent_id: agent_id.to_string(),
                reason: match self.error {
                    Some(message) => format!("success flag not set: {message}"),
                    None => "success flag not set".to_string(),
                },
            });
        }

        let value = match self.config {
            Some(value) if !value.is_null() => value,
            _ => {
                return Err(FetchError::MalformedResponse {
                    agent_id: agent_id.to_string(),
                    reason: "missing config".to_string(),
                })
            }
        };

        AgentConfig::from_json(value).map_err(|source| FetchError::InvalidConfig {
            agent_id: agent_id.to_string(),
            source,
        })
    }
}
