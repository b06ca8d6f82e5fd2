//! Shared application state for axum handlers.

use std::sync::Arc;

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_app::services::remote_service::RemoteService;
use tokio::sync::Mutex;

/// Application state shared across all axum handlers.
///
/// Generic over the storage and blaster types to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` is cloned.
pub struct AppState<S, B> {
    /// The one service instance; holding the lock serializes operations.
    /// A learn capture runs with the lock released.
    pub service: Arc<Mutex<RemoteService<S, B>>>,
}

impl<S, B> Clone for AppState<S, B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S, B> AppState<S, B>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    pub fn new(service: RemoteService<S, B>) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
        }
    }
}
