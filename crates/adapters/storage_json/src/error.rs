//! Storage-specific error type wrapping file and JSON errors.

use std::path::PathBuf;

use irhub_domain::error::IrHubError;

/// Errors originating from the JSON file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or renaming a file failed.
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored file is not valid JSON.
    #[error("invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be serialized.
    #[error("could not serialize document")]
    Serialize(#[source] serde_json::Error),
}

impl From<StorageError> for IrHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
