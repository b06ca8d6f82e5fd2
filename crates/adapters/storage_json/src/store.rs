//! JSON file implementation of [`DocumentStore`].

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use irhub_app::ports::DocumentStore;
use irhub_domain::error::IrHubError;
use serde_json::Value;

use crate::error::StorageError;

/// Stores the document in a single file, e.g. `irhub.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. Nothing is touched until the first
    /// load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Result<Option<Value>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })
    }

    async fn write(&self, document: &Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(StorageError::Serialize)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(io_error(&temp))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(io_error(&self.path))?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "document saved");
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + use<> {
    let path = path.to_path_buf();
    move |source| StorageError::Io { path, source }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> impl Future<Output = Result<Option<Value>, IrHubError>> + Send {
        async move { Ok(self.read().await?) }
    }

    fn save(&self, document: Value) -> impl Future<Output = Result<(), IrHubError>> + Send {
        async move { Ok(self.write(&document).await?) }
    }
}
