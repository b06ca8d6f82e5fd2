use std::collections::{BTreeSet, HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use irhub_app::ports::{Blaster, CaptureRequest, CodeExtractor};
use irhub_domain::error::{CaptureError, IrHubError};

use crate::error::VirtualBlasterError;

/// One recorded send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub blaster: String,
    /// Payload exactly as received, i.e. in `b64:` transport form.
    pub payload: String,
}

type CaptureKey = (String, String, String);

/// Sends kept by [`VirtualBlaster::transmissions`]; older ones are dropped.
pub const TRANSMISSION_LOG_LIMIT: usize = 256;

/// In-memory blaster; see the crate docs.
#[derive(Debug, Default)]
pub struct VirtualBlaster {
    /// Blaster references answered for. Empty means every reference.
    blasters: BTreeSet<String>,
    auto_code: bool,
    capture_delay: Duration,
    captures: AtomicU64,
    sent: Mutex<VecDeque<Transmission>>,
    learned: Mutex<HashMap<CaptureKey, String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VirtualBlaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only answer for `blaster`. May be called several times.
    #[must_use]
    pub fn with_blaster(mut self, blaster: impl Into<String>) -> Self {
        self.blasters.insert(blaster.into());
        self
    }

    /// Leave a generated code behind after each capture.
    #[must_use]
    pub fn with_auto_code(mut self, auto_code: bool) -> Self {
        self.auto_code = auto_code;
        self
    }

    /// Time a capture takes before it succeeds.
    #[must_use]
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// The last [`TRANSMISSION_LOG_LIMIT`] sends, oldest first.
    #[must_use]
    pub fn transmissions(&self) -> Vec<Transmission> {
        lock(&self.sent).iter().cloned().collect()
    }

    fn check(&self, blaster: &str) -> Result<(), VirtualBlasterError> {
        if self.blasters.is_empty() || self.blasters.contains(blaster) {
            Ok(())
        } else {
            Err(VirtualBlasterError::UnknownBlaster(blaster.to_string()))
        }
    }

    fn generate_code(&self, request: &CaptureRequest) -> String {
        let sequence = self.captures.fetch_add(1, Ordering::Relaxed);
        let signal = format!(
            "{}:{}:{}:{sequence}",
            request.command_type, request.device_label, request.command_label
        );
        STANDARD.encode(signal)
    }
}

impl Blaster for VirtualBlaster {
    fn send(
        &self,
        blaster: &str,
        encoded: &str,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        let result = self.check(blaster).map(|()| {
            let mut sent = lock(&self.sent);
            if sent.len() == TRANSMISSION_LOG_LIMIT {
                sent.pop_front();
            }
            sent.push_back(Transmission {
                blaster: blaster.to_string(),
                payload: encoded.to_string(),
            });
            tracing::debug!(blaster, payload = encoded, "virtual transmission");
        });
        async move { Ok(result?) }
    }

    fn capture(
        &self,
        request: &CaptureRequest,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        let request = request.clone();
        async move {
            self.check(&request.blaster)
                .map_err(|err| CaptureError::Rejected(err.to_string()))?;
            if !self.capture_delay.is_zero() {
                tokio::time::sleep(self.capture_delay).await;
            }
            if self.auto_code {
                let code = self.generate_code(&request);
                lock(&self.learned).insert(
                    (request.blaster, request.device_label, request.command_label),
                    code,
                );
            }
            Ok(())
        }
    }
}

#[async_trait]
impl CodeExtractor for VirtualBlaster {
    fn name(&self) -> &'static str {
        "virtual"
    }

    fn supports(&self, blaster: &str) -> bool {
        self.check(blaster).is_ok()
    }

    async fn retrieve_learned_code(
        &self,
        blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String> {
        let key = (
            blaster.to_string(),
            device_label.to_string(),
            command_label.to_string(),
        );
        // a capture is read back once, like a temporary learn slot
        lock(&self.learned).remove(&key)
    }
}
