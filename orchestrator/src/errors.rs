//! Error types for the provost orchestrator

use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    #[error("Executor error: {0}")]
    ExecutorError(String),

    #[error("Executor rejected request: {0}")]
    ExecutorRejected(String),

    #[error("Executor unavailable: {0}")]
    ExecutorUnavailable(String),

    #[error("Order conflict: {0}")]
    OrderConflict(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Whether a failed executor call may succeed on a later attempt.
    ///
    /// Transport failures and executor 5xx responses are transient;
    /// application-level rejections and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::HttpError(_) | OrchestratorError::ExecutorError(_)
        )
    }
}

impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        OrchestratorError::Internal(err.to_string())
    }
}
