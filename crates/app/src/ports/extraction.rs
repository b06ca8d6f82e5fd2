//! Extraction port — read a captured code back from vendor storage.
//!
//! Strategies are held as trait objects in a registry, hence `async_trait`
//! rather than `impl Future` returns.

use std::sync::Arc;

use async_trait::async_trait;

/// A vendor-specific way to retrieve a freshly learned code.
#[async_trait]
pub trait CodeExtractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy knows how to read codes for `blaster`.
    fn supports(&self, blaster: &str) -> bool;

    /// The base64 code captured under the given labels.
    ///
    /// Returns `None` when nothing matches. Must not fail: any read or parse
    /// problem also yields `None`.
    async fn retrieve_learned_code(
        &self,
        blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String>;
}

#[async_trait]
impl<T: CodeExtractor + ?Sized> CodeExtractor for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supports(&self, blaster: &str) -> bool {
        (**self).supports(blaster)
    }

    async fn retrieve_learned_code(
        &self,
        blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String> {
        (**self)
            .retrieve_learned_code(blaster, device_label, command_label)
            .await
    }
}
