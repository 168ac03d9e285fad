//! Error types for VOX operations

use std::time::Duration;
use thiserror::Error;

/// Control-plane fetch errors.
///
/// "Not found" is deliberately absent: a 404 is a normal outcome and is
/// reported as `Ok(None)` by fetchers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request for agent {agent_id} timed out after {timeout:?}")]
    Timeout { agent_id: String, timeout: Duration },

    #[error("Transport error for agent {agent_id}: {reason}")]
    Transport { agent_id: String, reason: String },

    #[error("Control plane returned status {status} for agent {agent_id}: {body}")]
    Status {
        agent_id: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response for agent {agent_id}: {reason}")]
    MalformedResponse { agent_id: String, reason: String },

    #[error("Invalid configuration for agent {agent_id}: {source}")]
    InvalidConfig {
        agent_id: String,
        source: ValidationError,
    },

    #[error("Fetch task for agent {agent_id} aborted: {reason}")]
    Aborted { agent_id: String, reason: String },
}

impl FetchError {
    /// Whether this failure is a transient network condition.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Transport { .. })
    }

    /// Whether the backend violated its response contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            FetchError::MalformedResponse { .. } | FetchError::InvalidConfig { .. }
        )
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unsupported {subsystem} provider: {provider} (supported: {supported})")]
    UnsupportedProvider {
        subsystem: String,
        provider: String,
        supported: String,
    },

    #[error("Malformed configuration payload: {reason}")]
    Malformed { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all VOX errors.
#[derive(Debug, Clone, Error)]
pub enum VoxError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for VOX operations.
pub type VoxResult<T> = Result<T, VoxError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_timeout() {
        let err = FetchError::Timeout {
            agent_id: "agent-7".to_string(),
            timeout: Duration::from_secs(5),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("timed out"));
        assert!(msg.contains("agent-7"));
        assert!(msg.contains("5s"));
    }

    #[test]
    fn test_fetch_error_classification() {
        let timeout = FetchError::Timeout {
            agent_id: "a".to_string(),
            timeout: Duration::from_secs(1),
        };
        let transport = FetchError::Transport {
            agent_id: "a".to_string(),
            reason: "connection refused".to_string(),
        };
        let status = FetchError::Status {
            agent_id: "a".to_string(),
            status: 503,
            body: "unavailable".to_string(),
        };
        let malformed = FetchError::MalformedResponse {
            agent_id: "a".to_string(),
            reason: "missing config".to_string(),
        };

        assert!(timeout.is_transient());
        assert!(transport.is_transient());
        assert!(!status.is_transient());
        assert!(!malformed.is_transient());

        assert!(malformed.is_contract_violation());
        assert!(!status.is_contract_violation());
    }

    #[test]
    fn test_validation_error_display_unsupported_provider() {
        let err = ValidationError::UnsupportedProvider {
            subsystem: "tts".to_string(),
            provider: "acme".to_string(),
            supported: "cartesia, openai".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("tts"));
        assert!(msg.contains("acme"));
        assert!(msg.contains("cartesia, openai"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "VOX_BACKEND_URL".to_string(),
            value: "ftp://x".to_string(),
            reason: "must be an http(s) url".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("VOX_BACKEND_URL"));
        assert!(msg.contains("ftp://x"));
        assert!(msg.contains("http(s)"));
    }

    #[test]
    fn test_vox_error_from_variants() {
        let fetch = VoxError::from(FetchError::Transport {
            agent_id: "a".to_string(),
            reason: "reset".to_string(),
        });
        assert!(matches!(fetch, VoxError::Fetch(_)));

        let validation = VoxError::from(ValidationError::RequiredFieldMissing {
            field: "agent_id".to_string(),
        });
        assert!(matches!(validation, VoxError::Validation(_)));

        let config = VoxError::from(ConfigError::MissingRequired {
            field: "VOX_BACKEND_URL".to_string(),
        });
        assert!(matches!(config, VoxError::Config(_)));
    }
}
