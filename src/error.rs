//! Unified error types for ytfex
//!
//! Error strategy:
//! - Per-track errors (fetch, decode, store, feature): recoverable, logged,
//!   the batch continues with the next item.
//! - Configuration errors (unknown feature key, unreadable work list):
//!   fatal, reported before the batch starts.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for ytfex operations
#[derive(Debug, Error)]
pub enum YtfexError {
    // =========================================================================
    // Recoverable errors - skip track, continue batch
    // =========================================================================
    #[error("Fetch failed for '{id}': {reason}")]
    FetchError { id: String, reason: String },

    #[error("Failed to decode audio file '{path}': {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Feature store error for '{path}': {reason}")]
    StoreError { path: PathBuf, reason: String },

    #[error("Feature '{key}' failed: {reason}")]
    FeatureError { key: String, reason: String },

    #[error("File not found: '{0}'")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Fatal errors - abort before the batch starts
    // =========================================================================
    #[error("Cannot read work list '{path}': {reason}")]
    WorklistError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ytfex operations
pub type Result<T> = std::result::Result<T, YtfexError>;

impl YtfexError {
    /// Returns true if this error is recoverable (skip track, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            YtfexError::FetchError { .. }
                | YtfexError::DecodeError { .. }
                | YtfexError::StoreError { .. }
                | YtfexError::FeatureError { .. }
                | YtfexError::FileNotFound(_)
        )
    }

    /// Create a decode error with context
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        YtfexError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a store error with context
    pub fn store_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        YtfexError::StoreError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a feature computation error with context
    pub fn feature_error(key: impl Into<String>, reason: impl Into<String>) -> Self {
        YtfexError::FeatureError {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a work list error with context
    pub fn worklist_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        YtfexError::WorklistError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
