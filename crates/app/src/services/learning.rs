//! Learning orchestrator — capture a signal, then try to read its code back.
//!
//! ```text
//! Idle ─▶ Capturing ─▶ CodeRetrieved
//!                  └─▶ RetrievalFailed
//! ```
//!
//! A failed capture (including a timeout) ends the attempt with an error. A
//! capture whose code cannot be retrieved ends with
//! [`LearnOutcome::ManualEntryRequired`] and leaves the device unchanged.
//!
//! The capture itself can take up to two minutes, so it runs apart from the
//! store: callers holding the store behind a lock release it in between.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use irhub_domain::command::{CommandCode, CommandType, IrCommand};
use irhub_domain::error::{CaptureError, DuplicateError, IrHubError, ValidationError};
use irhub_domain::id::DeviceId;

use crate::ports::{Blaster, CaptureRequest, DocumentStore};
use crate::services::command_store::CommandStore;
use crate::services::extraction_registry::ExtractorRegistry;
use crate::services::resolver::CommandResolver;

/// Accepted capture timeouts, in seconds.
pub const LEARN_TIMEOUT_SECS: RangeInclusive<u64> = 10..=120;
/// Capture timeout used when the caller does not pick one.
pub const DEFAULT_LEARN_TIMEOUT_SECS: u64 = 30;

/// Where a learn attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnPhase {
    Idle,
    Capturing,
    CodeRetrieved,
    RetrievalFailed,
}

impl LearnPhase {
    /// The phase after `next`, or `None` if that transition is not allowed.
    #[must_use]
    pub fn advance(self, next: Self) -> Option<Self> {
        match (self, next) {
            (Self::Idle, Self::Capturing)
            | (Self::Capturing, Self::CodeRetrieved | Self::RetrievalFailed) => Some(next),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::CodeRetrieved | Self::RetrievalFailed)
    }
}

/// Parameters of one learn attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnRequest {
    pub name: String,
    pub command_type: CommandType,
    pub timeout_secs: u64,
    /// Icon given to the command when it is learned.
    pub icon: Option<String>,
}

impl LearnRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_type: CommandType::Ir,
            timeout_secs: DEFAULT_LEARN_TIMEOUT_SECS,
            icon: None,
        }
    }
}

/// How a learn attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnOutcome {
    /// The code was read back and stored as a new command.
    Learned(IrCommand),
    /// The capture succeeded but no code could be read back; ask for it.
    ManualEntryRequired,
}

/// Labels the blaster files a capture under.
///
/// They differ from the final names so a capture never collides with
/// commands the blaster itself already knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLabels {
    pub device: String,
    pub command: String,
}

impl CaptureLabels {
    #[must_use]
    pub fn new(device_id: DeviceId, command_name: &str) -> Self {
        let id = device_id.to_string();
        Self {
            device: format!("_irhub_{}", &id[..8]),
            command: format!("_temp_{command_name}"),
        }
    }
}

/// Tracks the phase of one attempt and logs each transition.
struct Session {
    phase: LearnPhase,
}

impl Session {
    fn enter(&mut self, next: LearnPhase) {
        if let Some(phase) = self.phase.advance(next) {
            tracing::debug!(from = ?self.phase, to = ?phase, "learn phase");
            self.phase = phase;
        }
    }
}

/// Drives capture and extraction; see the module docs.
///
/// An attempt runs in three steps so the store is only needed at the ends:
/// [`prepare`](Self::prepare) validates against the current devices,
/// [`PendingLearn::capture`] waits on the blaster and touches no stored
/// state, and [`CapturedLearn::commit`] writes the result back.
pub struct LearningOrchestrator {
    registry: Arc<ExtractorRegistry>,
}

impl LearningOrchestrator {
    #[must_use]
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Check a learn request against the current devices and build the
    /// capture it will run.
    ///
    /// # Errors
    ///
    /// - [`IrHubError::Validation`] for a blank name or a timeout outside
    ///   [`LEARN_TIMEOUT_SECS`]
    /// - [`IrHubError::NotFound`] for an unknown device
    /// - [`IrHubError::Duplicate`] when the name already exists
    pub fn prepare<B: Blaster>(
        &self,
        resolver: CommandResolver<'_>,
        blaster: Arc<B>,
        device_id: DeviceId,
        request: LearnRequest,
    ) -> Result<PendingLearn<B>, IrHubError> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !LEARN_TIMEOUT_SECS.contains(&request.timeout_secs) {
            return Err(ValidationError::TimeoutOutOfRange {
                min: *LEARN_TIMEOUT_SECS.start(),
                max: *LEARN_TIMEOUT_SECS.end(),
                actual: request.timeout_secs,
            }
            .into());
        }
        let device = resolver.get_device(device_id)?;
        if device.has_command(&request.name) {
            return Err(DuplicateError {
                entity: "Command",
                name: request.name,
            }
            .into());
        }

        let labels = CaptureLabels::new(device_id, &request.name);
        let capture = CaptureRequest {
            blaster: device.blaster.clone(),
            device_label: labels.device,
            command_label: labels.command,
            command_type: request.command_type,
            timeout: Duration::from_secs(request.timeout_secs),
        };
        tracing::info!(device_name = %device.name, command_name = %request.name, "starting learning");

        Ok(PendingLearn {
            blaster,
            registry: Arc::clone(&self.registry),
            device_id,
            capture,
            request,
        })
    }

    /// Run one learn attempt for `device_id` from start to finish.
    ///
    /// # Errors
    ///
    /// Everything [`prepare`](Self::prepare), [`PendingLearn::capture`] and
    /// [`CapturedLearn::commit`] can return.
    #[tracing::instrument(skip(self, store, blaster, request), fields(command_name = %request.name))]
    pub async fn learn<S: DocumentStore, B: Blaster>(
        &self,
        store: &mut CommandStore<S>,
        blaster: Arc<B>,
        device_id: DeviceId,
        request: LearnRequest,
    ) -> Result<LearnOutcome, IrHubError> {
        let pending = self.prepare(store.resolver(), blaster, device_id, request)?;
        pending.capture().await?.commit(store).await
    }
}

/// A validated attempt waiting for its capture.
pub struct PendingLearn<B> {
    blaster: Arc<B>,
    registry: Arc<ExtractorRegistry>,
    device_id: DeviceId,
    capture: CaptureRequest,
    request: LearnRequest,
}

impl<B: Blaster> PendingLearn<B> {
    #[must_use]
    pub fn capture_request(&self) -> &CaptureRequest {
        &self.capture
    }

    /// Put the blaster in learning mode, then try to read the code back.
    ///
    /// # Errors
    ///
    /// [`IrHubError::CaptureFailed`] or the blaster's error when the capture
    /// fails or times out.
    pub async fn capture(self) -> Result<CapturedLearn, IrHubError> {
        let mut session = Session {
            phase: LearnPhase::Idle,
        };
        session.enter(LearnPhase::Capturing);
        let seconds = self.request.timeout_secs;
        match tokio::time::timeout(self.capture.timeout, self.blaster.capture(&self.capture)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(error = %err, command_name = %self.request.name, "learning failed");
                return Err(err);
            }
            Err(_) => {
                tracing::error!(seconds, command_name = %self.request.name, "learning timed out");
                return Err(CaptureError::Timeout { seconds }.into());
            }
        }

        let retrieved = self
            .registry
            .retrieve_learned_code(
                &self.capture.blaster,
                &self.capture.device_label,
                &self.capture.command_label,
            )
            .await;
        let code = match retrieved.as_deref().map(CommandCode::parse) {
            Some(Ok(code)) => {
                session.enter(LearnPhase::CodeRetrieved);
                Some(code)
            }
            Some(Err(err)) => {
                session.enter(LearnPhase::RetrievalFailed);
                tracing::warn!(error = %err, "retrieved code is not valid base64, manual input required");
                None
            }
            None => {
                session.enter(LearnPhase::RetrievalFailed);
                tracing::warn!("could not retrieve learned code, manual input required");
                None
            }
        };
        Ok(CapturedLearn {
            device_id: self.device_id,
            request: self.request,
            code,
        })
    }
}

/// A finished capture, ready to be written back.
#[derive(Debug, Clone)]
pub struct CapturedLearn {
    device_id: DeviceId,
    request: LearnRequest,
    code: Option<CommandCode>,
}

impl CapturedLearn {
    #[must_use]
    pub fn code(&self) -> Option<&CommandCode> {
        self.code.as_ref()
    }

    /// Store the learned command.
    ///
    /// The device and name are checked again since the store may have
    /// changed while the capture ran.
    ///
    /// # Errors
    ///
    /// - [`IrHubError::NotFound`] when the device was removed meanwhile
    /// - [`IrHubError::Duplicate`] when the name was taken meanwhile
    /// - a storage error when the command cannot be persisted
    pub async fn commit<S: DocumentStore>(
        self,
        store: &mut CommandStore<S>,
    ) -> Result<LearnOutcome, IrHubError> {
        let Some(code) = self.code else {
            return Ok(LearnOutcome::ManualEntryRequired);
        };
        let mut builder = IrCommand::builder()
            .name(self.request.name)
            .code(code)
            .command_type(self.request.command_type);
        if let Some(icon) = self.request.icon {
            builder = builder.icon(icon);
        }
        let command = store.add_command(self.device_id, builder.build()?).await?;
        tracing::info!(command_name = %command.name, "learned command");
        Ok(LearnOutcome::Learned(command))
    }
}

#[cfg(test)]
mod tests {
    use irhub_domain::device::VirtualDevice;

    use super::*;
    use crate::fakes::{CaptureBehaviour, InMemoryDocumentStore, RecordingBlaster, ScriptedExtractor};

    const BLASTER: &str = "remote.living_room";

    async fn setup() -> (CommandStore<InMemoryDocumentStore>, DeviceId) {
        let mut store = CommandStore::load(InMemoryDocumentStore::default())
            .await
            .unwrap();
        let device = store
            .add_device(
                VirtualDevice::builder()
                    .name("TV")
                    .blaster(BLASTER)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        (store, device.id)
    }

    fn orchestrator_with(extractor: ScriptedExtractor) -> LearningOrchestrator {
        LearningOrchestrator::new(ExtractorRegistry::new().with(Arc::new(extractor)))
    }

    #[test]
    fn should_build_capture_labels_from_device_prefix() {
        let id: DeviceId = "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap();
        let labels = CaptureLabels::new(id, "Power");
        assert_eq!(labels.device, "_irhub_0f8fad5b");
        assert_eq!(labels.command, "_temp_Power");
    }

    #[test]
    fn should_only_allow_forward_transitions() {
        assert_eq!(
            LearnPhase::Idle.advance(LearnPhase::Capturing),
            Some(LearnPhase::Capturing)
        );
        assert_eq!(
            LearnPhase::Capturing.advance(LearnPhase::RetrievalFailed),
            Some(LearnPhase::RetrievalFailed)
        );
        assert_eq!(LearnPhase::Idle.advance(LearnPhase::CodeRetrieved), None);
        assert_eq!(LearnPhase::CodeRetrieved.advance(LearnPhase::Capturing), None);
        assert!(LearnPhase::RetrievalFailed.is_terminal());
    }

    #[tokio::test]
    async fn should_store_command_when_code_retrieved() {
        let (mut store, id) = setup().await;
        let labels = CaptureLabels::new(id, "Power");
        let orchestrator = orchestrator_with(
            ScriptedExtractor::new(BLASTER).with_code(&labels.device, &labels.command, "JgBQAA=="),
        );
        let blaster = Arc::new(RecordingBlaster::default());
        let mut request = LearnRequest::new("Power");
        request.icon = Some("mdi:power".into());

        let outcome = orchestrator
            .learn(&mut store, blaster.clone(), id, request)
            .await
            .unwrap();

        let LearnOutcome::Learned(command) = outcome else {
            panic!("expected a learned command");
        };
        assert_eq!(command.code.as_str(), "JgBQAA==");
        assert_eq!(command.icon.as_deref(), Some("mdi:power"));
        assert!(store.resolver().command_exists(id, "power"));

        let captures = blaster.captures.lock().unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].device_label, labels.device);
        assert_eq!(captures[0].command_label, "_temp_Power");
        assert_eq!(captures[0].timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn should_ask_for_manual_entry_when_extraction_finds_nothing() {
        let (mut store, id) = setup().await;
        let orchestrator = orchestrator_with(ScriptedExtractor::new(BLASTER));
        let outcome = orchestrator
            .learn(&mut store, Arc::new(RecordingBlaster::default()), id, LearnRequest::new("Power"))
            .await
            .unwrap();
        assert_eq!(outcome, LearnOutcome::ManualEntryRequired);
        assert!(store.resolver().get_device(id).unwrap().commands.is_empty());
    }

    #[tokio::test]
    async fn should_ask_for_manual_entry_when_retrieved_code_is_invalid() {
        let (mut store, id) = setup().await;
        let labels = CaptureLabels::new(id, "Power");
        let orchestrator = orchestrator_with(
            ScriptedExtractor::new(BLASTER).with_code(&labels.device, &labels.command, "%%%"),
        );
        let outcome = orchestrator
            .learn(&mut store, Arc::new(RecordingBlaster::default()), id, LearnRequest::new("Power"))
            .await
            .unwrap();
        assert_eq!(outcome, LearnOutcome::ManualEntryRequired);
    }

    #[tokio::test]
    async fn should_fail_fast_on_duplicate_without_capturing() {
        let (mut store, id) = setup().await;
        store
            .add_command(
                id,
                IrCommand::builder()
                    .name("Power")
                    .code(CommandCode::parse("JgBQAA==").unwrap())
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        let blaster = Arc::new(RecordingBlaster::default());
        let result = orchestrator_with(ScriptedExtractor::new(BLASTER))
            .learn(&mut store, blaster.clone(), id, LearnRequest::new("POWER"))
            .await;
        assert!(matches!(result, Err(IrHubError::Duplicate(_))));
        assert!(blaster.captures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_timeout_outside_range() {
        let (mut store, id) = setup().await;
        let mut request = LearnRequest::new("Power");
        request.timeout_secs = 5;
        let result = orchestrator_with(ScriptedExtractor::new(BLASTER))
            .learn(&mut store, Arc::new(RecordingBlaster::default()), id, request)
            .await;
        assert!(matches!(
            result,
            Err(IrHubError::Validation(ValidationError::TimeoutOutOfRange { actual: 5, .. }))
        ));
    }

    #[tokio::test]
    async fn should_surface_capture_rejection() {
        let (mut store, id) = setup().await;
        let result = orchestrator_with(ScriptedExtractor::new(BLASTER))
            .learn(
                &mut store,
                Arc::new(RecordingBlaster::capturing(CaptureBehaviour::Reject)),
                id,
                LearnRequest::new("Power"),
            )
            .await;
        assert!(matches!(
            result,
            Err(IrHubError::CaptureFailed(CaptureError::Rejected(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_time_out_when_capture_never_returns() {
        let (mut store, id) = setup().await;
        let mut request = LearnRequest::new("Power");
        request.timeout_secs = 10;
        let start = tokio::time::Instant::now();
        let result = orchestrator_with(ScriptedExtractor::new(BLASTER))
            .learn(
                &mut store,
                Arc::new(RecordingBlaster::capturing(CaptureBehaviour::Hang)),
                id,
                request,
            )
            .await;
        assert!(matches!(
            result,
            Err(IrHubError::CaptureFailed(CaptureError::Timeout { seconds: 10 }))
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn should_capture_without_holding_the_store() {
        let (mut store, id) = setup().await;
        let labels = CaptureLabels::new(id, "Power");
        let orchestrator = orchestrator_with(
            ScriptedExtractor::new(BLASTER).with_code(&labels.device, &labels.command, "JgBQAA=="),
        );
        let pending = orchestrator
            .prepare(
                store.resolver(),
                Arc::new(RecordingBlaster::default()),
                id,
                LearnRequest::new("Power"),
            )
            .unwrap();
        assert_eq!(pending.capture_request().command_label, "_temp_Power");

        // the store stays writable while the capture is outstanding
        store
            .add_device(
                VirtualDevice::builder()
                    .name("Soundbar")
                    .blaster(BLASTER)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let captured = pending.capture().await.unwrap();
        assert_eq!(captured.code().map(CommandCode::as_str), Some("JgBQAA=="));
        let outcome = captured.commit(&mut store).await.unwrap();
        assert!(matches!(outcome, LearnOutcome::Learned(_)));
        assert_eq!(store.resolver().devices().count(), 2);
    }

    #[tokio::test]
    async fn should_report_duplicate_when_name_taken_during_capture() {
        let (mut store, id) = setup().await;
        let labels = CaptureLabels::new(id, "Power");
        let orchestrator = orchestrator_with(
            ScriptedExtractor::new(BLASTER).with_code(&labels.device, &labels.command, "JgBQAA=="),
        );
        let pending = orchestrator
            .prepare(
                store.resolver(),
                Arc::new(RecordingBlaster::default()),
                id,
                LearnRequest::new("Power"),
            )
            .unwrap();
        let captured = pending.capture().await.unwrap();

        store
            .add_command(
                id,
                IrCommand::builder()
                    .name("power")
                    .code(CommandCode::parse("JgBRAA==").unwrap())
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let result = captured.commit(&mut store).await;
        assert!(matches!(result, Err(IrHubError::Duplicate(_))));
        let device = store.resolver().get_device(id).unwrap();
        assert_eq!(device.commands.len(), 1);
    }

    #[tokio::test]
    async fn should_report_not_found_when_device_removed_during_capture() {
        let (mut store, id) = setup().await;
        let labels = CaptureLabels::new(id, "Power");
        let orchestrator = orchestrator_with(
            ScriptedExtractor::new(BLASTER).with_code(&labels.device, &labels.command, "JgBQAA=="),
        );
        let pending = orchestrator
            .prepare(
                store.resolver(),
                Arc::new(RecordingBlaster::default()),
                id,
                LearnRequest::new("Power"),
            )
            .unwrap();
        let captured = pending.capture().await.unwrap();

        assert!(store.remove_device(id).await.unwrap());

        let result = captured.commit(&mut store).await;
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_device() {
        let (mut store, _) = setup().await;
        let result = orchestrator_with(ScriptedExtractor::new(BLASTER))
            .learn(
                &mut store,
                Arc::new(RecordingBlaster::default()),
                DeviceId::new(),
                LearnRequest::new("Power"),
            )
            .await;
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
    }
}
