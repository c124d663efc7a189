//! Error types for trustscore.
//!
//! Only [`TrustScoreError::InvalidReference`] ever escapes a full evaluation.
//! Every other variant is produced by collaborators and absorbed by the
//! judgment function that owns the call.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the trustscore library.
#[derive(Debug, Error)]
pub enum TrustScoreError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("{service} API error: {message}")]
    Api {
        service: String,
        message: String,
        status_code: Option<u16>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Input errors
    #[error("Invalid artifact reference {reference:?}: {message}")]
    InvalidReference { reference: String, message: String },

    #[error("Unsupported host: {host}")]
    UnsupportedHost { host: String },

    // Collaborator-specific failures
    #[error("Completion failed: {message}")]
    Completion { message: String },

    #[error("Execution failed: {message}")]
    Execution { message: String },

    #[error("Lineage computation failed: {message}")]
    Lineage { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for trustscore operations.
pub type Result<T> = std::result::Result<T, TrustScoreError>;

impl From<std::io::Error> for TrustScoreError {
    fn from(err: std::io::Error) -> Self {
        TrustScoreError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for TrustScoreError {
    fn from(err: serde_json::Error) -> Self {
        TrustScoreError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for TrustScoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TrustScoreError::Timeout(std::time::Duration::from_secs(0))
        } else {
            TrustScoreError::Network {
                message: err.to_string(),
                cause: err.url().map(|u| u.to_string()),
            }
        }
    }
}

impl TrustScoreError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        TrustScoreError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an invalid-reference error.
    pub fn invalid_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        TrustScoreError::InvalidReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrustScoreError::Network { .. }
                | TrustScoreError::Timeout(_)
                | TrustScoreError::RateLimited { .. }
        )
    }

    /// Check if this error is a caller input error rather than a collaborator fault.
    pub fn is_input_error(&self) -> bool {
        matches!(self, TrustScoreError::InvalidReference { .. })
    }
}
