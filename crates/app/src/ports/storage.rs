//! Storage port — the versioned document backing the command store.
//!
//! The store persists one JSON document holding every virtual device. The
//! application owns its shape and migrations; adapters only move bytes.

use std::future::Future;

use irhub_domain::error::IrHubError;
use serde_json::Value;

/// Durable key-value slot for the whole document.
pub trait DocumentStore: Send + Sync {
    /// Read the stored document, `None` when nothing was ever saved.
    fn load(&self) -> impl Future<Output = Result<Option<Value>, IrHubError>> + Send;

    /// Replace the stored document atomically.
    fn save(&self, document: Value) -> impl Future<Output = Result<(), IrHubError>> + Send;
}

impl<T: DocumentStore> DocumentStore for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<Value>, IrHubError>> + Send {
        (**self).load()
    }

    fn save(&self, document: Value) -> impl Future<Output = Result<(), IrHubError>> + Send {
        (**self).save(document)
    }
}
