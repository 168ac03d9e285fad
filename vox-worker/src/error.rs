//! Worker error types

use thiserror::Error;
use vox_core::VoxError;

/// Errors that stop the worker or a single session.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Vox(#[from] VoxError),

    #[error("Failed to initialize telemetry: {0}")]
    Telemetry(String),

    #[error("Could not resolve configuration for agent {agent_id}: {reason}")]
    Resolution { agent_id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
