//! Unified error types for CloneGPT Core.

use clonegpt_types::{StatusError, SyncError};
use serde::Serialize;
use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The status endpoint answered with a non-success status.
    #[error("Status fetch failed ({status}): {message}")]
    Fetch { status: u16, message: String },

    /// A rate-limit status did not satisfy its invariants.
    #[error("Invalid rate-limit status: {0}")]
    Status(#[from] StatusError),

    /// Cross-tab synchronization failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Unclassified error with message.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Unknown(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Unknown(s.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(e: url::ParseError) -> Self {
        AppError::Config(format!("invalid URL: {}", e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::Fetch { status: 503, message: "maintenance".into() };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Status fetch failed (503): maintenance\"");
    }

    #[test]
    fn test_from_sync_error() {
        let err: AppError = SyncError::Unsupported.into();
        assert!(matches!(err, AppError::Sync(SyncError::Unsupported)));
    }

    #[test]
    fn test_from_url_error() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, AppError::Config(_)));
    }
}
