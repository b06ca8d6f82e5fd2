//! Extraction registry — picks the code-extraction strategy for a blaster.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::CodeExtractor;

/// Fallback strategy: supports every blaster, never finds a code.
#[derive(Debug, Default)]
pub struct NoCodeAvailable;

#[async_trait]
impl CodeExtractor for NoCodeAvailable {
    fn name(&self) -> &'static str {
        "none"
    }

    fn supports(&self, _blaster: &str) -> bool {
        true
    }

    async fn retrieve_learned_code(
        &self,
        _blaster: &str,
        _device_label: &str,
        _command_label: &str,
    ) -> Option<String> {
        None
    }
}

/// Strategies in priority order, ending with [`NoCodeAvailable`].
#[derive(Default)]
pub struct ExtractorRegistry {
    strategies: Vec<Arc<dyn CodeExtractor>>,
    fallback: NoCodeAvailable,
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy after the ones already registered.
    #[must_use]
    pub fn with(mut self, strategy: Arc<dyn CodeExtractor>) -> Self {
        self.register(strategy);
        self
    }

    pub fn register(&mut self, strategy: Arc<dyn CodeExtractor>) {
        tracing::debug!(strategy = strategy.name(), "registered code extractor");
        self.strategies.push(strategy);
    }

    /// First strategy supporting `blaster`, or the fallback.
    #[must_use]
    pub fn select(&self, blaster: &str) -> &dyn CodeExtractor {
        self.strategies
            .iter()
            .find(|strategy| strategy.supports(blaster))
            .map_or(&self.fallback as &dyn CodeExtractor, |strategy| {
                strategy.as_ref()
            })
    }

    /// Ask the selected strategy for a captured code.
    pub async fn retrieve_learned_code(
        &self,
        blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String> {
        let strategy = self.select(blaster);
        let code = strategy
            .retrieve_learned_code(blaster, device_label, command_label)
            .await;
        if code.is_none() {
            tracing::debug!(
                strategy = strategy.name(),
                blaster,
                device_label,
                command_label,
                "no learned code found"
            );
        }
        code
    }
}
