//! Credential store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The settings file could not be written.
    #[error("Failed to write credentials to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings directory could not be created.
    #[error("Failed to create settings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking write task panicked or was cancelled.
    #[error("Credential write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// No settings location could be determined.
    #[error("No settings directory available on this platform")]
    NoSettingsDir,
}
