//! In-memory port implementations shared by the service tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use irhub_domain::error::{CaptureError, IrHubError};
use serde_json::Value;
use tokio::time::Instant;

use crate::ports::{Blaster, CaptureRequest, CodeExtractor, DocumentStore};

fn simulated(what: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other(format!("simulated {what} failure")))
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    pub document: Mutex<Option<Value>>,
    pub saves: AtomicUsize,
    pub fail_saves: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<Value> {
        self.document.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self) -> impl Future<Output = Result<Option<Value>, IrHubError>> + Send {
        let document = self.document.lock().unwrap().clone();
        async { Ok(document) }
    }

    fn save(&self, document: Value) -> impl Future<Output = Result<(), IrHubError>> + Send {
        let result = if self.fail_saves.load(Ordering::SeqCst) {
            Err(IrHubError::Storage(simulated("save")))
        } else {
            *self.document.lock().unwrap() = Some(document);
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        async { result }
    }
}

/// How the recording blaster answers a capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureBehaviour {
    #[default]
    Succeed,
    Reject,
    Hang,
}

#[derive(Default)]
pub struct RecordingBlaster {
    pub sent: Mutex<Vec<(String, String, Instant)>>,
    pub captures: Mutex<Vec<CaptureRequest>>,
    pub capture_behaviour: Mutex<CaptureBehaviour>,
    pub fail_sends: AtomicBool,
}

impl RecordingBlaster {
    pub fn capturing(behaviour: CaptureBehaviour) -> Self {
        Self {
            capture_behaviour: Mutex::new(behaviour),
            ..Self::default()
        }
    }

    /// Transport payloads in send order.
    pub fn payloads(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload, _)| payload.clone())
            .collect()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(_, _, at)| *at).collect()
    }
}

impl Blaster for RecordingBlaster {
    fn send(
        &self,
        blaster: &str,
        encoded: &str,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        let result = if self.fail_sends.load(Ordering::SeqCst) {
            Err(IrHubError::Blaster(simulated("send")))
        } else {
            self.sent.lock().unwrap().push((
                blaster.to_string(),
                encoded.to_string(),
                Instant::now(),
            ));
            Ok(())
        };
        async { result }
    }

    fn capture(
        &self,
        request: &CaptureRequest,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        self.captures.lock().unwrap().push(request.clone());
        let behaviour = *self.capture_behaviour.lock().unwrap();
        async move {
            match behaviour {
                CaptureBehaviour::Succeed => Ok(()),
                CaptureBehaviour::Reject => {
                    Err(CaptureError::Rejected("learning mode unavailable".into()).into())
                }
                CaptureBehaviour::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }
    }
}

/// Extractor that answers from a fixed table keyed by `(device, command)`.
pub struct ScriptedExtractor {
    pub blaster: String,
    pub codes: HashMap<(String, String), String>,
}

impl ScriptedExtractor {
    pub fn new(blaster: &str) -> Self {
        Self {
            blaster: blaster.to_string(),
            codes: HashMap::new(),
        }
    }

    pub fn with_code(mut self, device: &str, command: &str, code: &str) -> Self {
        self.codes
            .insert((device.to_string(), command.to_string()), code.to_string());
        self
    }
}

#[async_trait]
impl CodeExtractor for ScriptedExtractor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn supports(&self, blaster: &str) -> bool {
        self.blaster == blaster
    }

    async fn retrieve_learned_code(
        &self,
        _blaster: &str,
        device_label: &str,
        command_label: &str,
    ) -> Option<String> {
        self.codes
            .get(&(device_label.to_string(), command_label.to_string()))
            .cloned()
    }
}
