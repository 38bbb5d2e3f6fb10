//! Store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while submitting to a single store
///
/// Every variant is local to one store: the orchestrator records it as that
/// store's failed [`SubmissionResult`](crate::SubmissionResult) and keeps the
/// other submissions running.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A ZIP referenced by the configuration is missing on disk
    #[error("ZIP file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Credential exchange rejected by the vendor
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The vendor rejected the uploaded package
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Polling exceeded its bound without reaching a terminal state
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The vendor response did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Options that would be rejected by the vendor, caught before any request
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Non-success response from a store API
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Operation the configured API version does not offer
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Orchestrator-level failures
///
/// Per-store problems never surface here; they end up in the results map.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// No store sub-configuration was supplied
    #[error("No ZIP files detected to upload")]
    NoWork,
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
