//! Remote service — the facade driving adapters talk to.
//!
//! Owns the [`CommandStore`], the [`Dispatcher`] and the
//! [`LearningOrchestrator`]. Callers serialize access (every method that
//! mutates takes `&mut self`), so no two operations ever interleave.

use std::ops::RangeInclusive;
use std::time::Duration;

use irhub_domain::command::{CommandCode, CommandType, IrCommand};
use irhub_domain::cover::{self, CoverPlan, CoverStatus};
use irhub_domain::device::{DeviceType, VirtualDevice};
use irhub_domain::entity_config::{EntityConfig, EntityKind};
use irhub_domain::error::{IrHubError, NotFoundError, ValidationError};
use irhub_domain::id::DeviceId;
use irhub_domain::light::{self, LightPlan, LightStatus, TurnOn};
use irhub_domain::translate::CommandPlan;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::ports::{Blaster, DocumentStore};
use crate::services::command_store::CommandStore;
use crate::services::dispatcher::{BatchReport, Dispatcher};
use crate::services::extraction_registry::ExtractorRegistry;
use crate::services::learning::{
    CapturedLearn, LearnOutcome, LearnRequest, LearningOrchestrator, PendingLearn,
};
use crate::services::resolver::CommandResolver;

/// Accepted repeat counts for a send.
pub const SEND_REPEATS: RangeInclusive<u32> = 1..=10;

/// A command entered by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommand {
    pub name: String,
    /// Base64 code, with or without the `b64:` prefix.
    pub code: String,
    pub command_type: CommandType,
    pub icon: Option<String>,
}

/// Several commands sent one after the other.
#[derive(Debug, Clone, PartialEq)]
pub struct SendBatch {
    pub commands: Vec<String>,
    pub num_repeats: u32,
    pub delay_secs: Option<f64>,
}

/// What a device looks like as a remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteStatus {
    pub activity_list: Vec<String>,
    pub current_activity: Option<String>,
    pub command_count: usize,
    pub blaster: String,
}

/// Per-entity plan: commands to send and how they change the stored state.
trait EntityPlan {
    fn commands(&self) -> &CommandPlan;
    fn write_state(&self, state: &mut Map<String, Value>);
}

impl EntityPlan for LightPlan {
    fn commands(&self) -> &CommandPlan {
        &self.commands
    }

    fn write_state(&self, state: &mut Map<String, Value>) {
        self.state.write_into(state);
    }
}

impl EntityPlan for CoverPlan {
    fn commands(&self) -> &CommandPlan {
        &self.commands
    }

    fn write_state(&self, state: &mut Map<String, Value>) {
        self.state.write_into(state);
    }
}

fn entity_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Light => "Light",
        EntityKind::Cover => "Cover",
        EntityKind::Fan => "Fan",
    }
}

fn active_entity(
    resolver: CommandResolver<'_>,
    device_id: DeviceId,
    kind: EntityKind,
) -> Result<(&VirtualDevice, &EntityConfig), IrHubError> {
    let device = resolver.get_device(device_id)?;
    let config = device.active_entity(kind).ok_or_else(|| NotFoundError {
        entity: entity_label(kind),
        id: device_id.to_string(),
    })?;
    Ok((device, config))
}

fn check_repeats(repeats: u32) -> Result<(), ValidationError> {
    if SEND_REPEATS.contains(&repeats) {
        Ok(())
    } else {
        Err(ValidationError::RepeatsOutOfRange {
            min: *SEND_REPEATS.start(),
            max: *SEND_REPEATS.end(),
            actual: repeats,
        })
    }
}

/// Application service for virtual devices and their commands.
pub struct RemoteService<S, B> {
    store: CommandStore<S>,
    dispatcher: Dispatcher<B>,
    learning: LearningOrchestrator,
}

impl<S: DocumentStore, B: Blaster> RemoteService<S, B> {
    pub fn new(store: CommandStore<S>, blaster: B, registry: ExtractorRegistry) -> Self {
        Self {
            store,
            dispatcher: Dispatcher::new(blaster),
            learning: LearningOrchestrator::new(registry),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> CommandResolver<'_> {
        self.store.resolver()
    }

    #[must_use]
    pub fn list_devices(&self) -> Vec<VirtualDevice> {
        self.store.resolver().devices().cloned().collect()
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when no device has this id.
    pub fn get_device(&self, id: DeviceId) -> Result<VirtualDevice, IrHubError> {
        self.store.resolver().get_device(id).cloned()
    }

    /// Create a device bound to `blaster`.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] for an empty name or blaster,
    /// [`IrHubError::Duplicate`] on a name clash, or a storage error.
    pub async fn create_device(
        &mut self,
        name: &str,
        blaster: &str,
    ) -> Result<VirtualDevice, IrHubError> {
        let device = VirtualDevice::builder()
            .name(name.trim())
            .blaster(blaster.trim())
            .build()?;
        self.store.add_device(device).await
    }

    /// Remove a device. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails.
    pub async fn remove_device(&mut self, id: DeviceId) -> Result<bool, IrHubError> {
        self.dispatcher.forget(id);
        self.store.remove_device(id).await
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for an unknown device, or a storage
    /// error.
    pub async fn set_device_type(
        &mut self,
        id: DeviceId,
        device_type: DeviceType,
    ) -> Result<VirtualDevice, IrHubError> {
        self.store.set_device_type(id, device_type).await
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for an unknown device, or a storage
    /// error.
    pub async fn set_entity_config(
        &mut self,
        id: DeviceId,
        kind: EntityKind,
        config: EntityConfig,
    ) -> Result<VirtualDevice, IrHubError> {
        self.store.set_entity_config(id, kind, config).await
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or the command is
    /// absent, or a storage error.
    pub async fn update_command_icon(
        &mut self,
        id: DeviceId,
        name: &str,
        icon: Option<String>,
    ) -> Result<IrCommand, IrHubError> {
        self.store.update_command_icon(id, name, icon).await
    }

    /// Capture a new command and store it if its code can be read back.
    ///
    /// Holds `self` for the whole capture; callers sharing the service should
    /// use [`prepare_learn`](Self::prepare_learn) and
    /// [`finish_learn`](Self::finish_learn) instead.
    ///
    /// # Errors
    ///
    /// See [`LearningOrchestrator::learn`].
    pub async fn learn_command(
        &mut self,
        id: DeviceId,
        request: LearnRequest,
    ) -> Result<LearnOutcome, IrHubError> {
        self.learning
            .learn(&mut self.store, self.dispatcher.blaster(), id, request)
            .await
    }

    /// Validate a learn request; the returned attempt captures on its own.
    ///
    /// # Errors
    ///
    /// See [`LearningOrchestrator::prepare`].
    pub fn prepare_learn(
        &self,
        id: DeviceId,
        request: LearnRequest,
    ) -> Result<PendingLearn<B>, IrHubError> {
        self.learning
            .prepare(self.store.resolver(), self.dispatcher.blaster(), id, request)
    }

    /// Store the result of a capture started with
    /// [`prepare_learn`](Self::prepare_learn).
    ///
    /// # Errors
    ///
    /// See [`CapturedLearn::commit`].
    pub async fn finish_learn(
        &mut self,
        captured: CapturedLearn,
    ) -> Result<LearnOutcome, IrHubError> {
        captured.commit(&mut self.store).await
    }

    /// Store a command whose code was entered by hand.
    ///
    /// The code is validated before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] for a blank name or a code that is
    /// not base64, [`IrHubError::NotFound`], [`IrHubError::Duplicate`], or a
    /// storage error.
    #[tracing::instrument(skip(self, request), fields(command_name = %request.name))]
    pub async fn add_command(
        &mut self,
        id: DeviceId,
        request: AddCommand,
    ) -> Result<IrCommand, IrHubError> {
        let code = CommandCode::parse(&request.code)?;
        let mut builder = IrCommand::builder()
            .name(request.name.trim())
            .code(code)
            .command_type(request.command_type);
        if let Some(icon) = request.icon {
            builder = builder.icon(icon);
        }
        self.store.add_command(id, builder.build()?).await
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or the command is
    /// absent, or a storage error.
    pub async fn delete_command(
        &mut self,
        id: DeviceId,
        name: &str,
    ) -> Result<IrCommand, IrHubError> {
        self.store.remove_command(id, name).await
    }

    /// Send one command `repeats` times.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] for a repeat count outside
    /// [`SEND_REPEATS`], [`IrHubError::NotFound`], or the blaster's error.
    #[tracing::instrument(skip(self))]
    pub async fn send_command(
        &mut self,
        id: DeviceId,
        name: &str,
        repeats: u32,
    ) -> Result<(), IrHubError> {
        check_repeats(repeats)?;
        let device = self.store.resolver().get_device(id)?;
        self.dispatcher.send_command(device, name, repeats).await
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when no device has this id.
    pub fn remote_status(&self, id: DeviceId) -> Result<RemoteStatus, IrHubError> {
        let device = self.store.resolver().get_device(id)?;
        Ok(RemoteStatus {
            activity_list: device.activity_list(),
            current_activity: self.dispatcher.last_sent(id).map(str::to_string),
            command_count: device.commands.len(),
            blaster: device.blaster.clone(),
        })
    }

    /// Send several commands in order, skipping unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] for a bad repeat count or delay,
    /// [`IrHubError::NotFound`] for an unknown device, or the blaster's error.
    #[tracing::instrument(skip(self, batch), fields(count = batch.commands.len()))]
    pub async fn send_batch(
        &mut self,
        id: DeviceId,
        batch: SendBatch,
    ) -> Result<BatchReport, IrHubError> {
        check_repeats(batch.num_repeats)?;
        let delay = batch
            .delay_secs
            .map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(|_| ValidationError::InvalidDelay)?;
        let device = self.store.resolver().get_device(id)?;
        self.dispatcher
            .send_batch(device, &batch.commands, batch.num_repeats, delay)
            .await
    }

    async fn execute<P: EntityPlan>(
        &mut self,
        id: DeviceId,
        kind: EntityKind,
        plan: impl FnOnce(&EntityConfig) -> P,
    ) -> Result<EntityConfig, IrHubError> {
        let (device, config) = active_entity(self.store.resolver(), id, kind)?;
        let plan = plan(config);
        let mut updated = config.clone();
        plan.write_state(&mut updated.state);
        self.dispatcher.send_plan(device, plan.commands()).await?;
        self.store
            .save_entity_state(id, kind, updated.state.clone())
            .await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device has no enabled light.
    pub fn light_status(&self, id: DeviceId) -> Result<LightStatus, IrHubError> {
        let (_, config) = active_entity(self.store.resolver(), id, EntityKind::Light)?;
        Ok(LightStatus::from_config(config))
    }

    /// Turn the light on, then apply the requested adjustments.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device has no enabled light
    /// or a mapped command is missing, the blaster's error, or a storage
    /// error.
    #[tracing::instrument(skip(self))]
    pub async fn light_turn_on(
        &mut self,
        id: DeviceId,
        request: &TurnOn,
    ) -> Result<LightStatus, IrHubError> {
        let config = self
            .execute(id, EntityKind::Light, |config| {
                light::plan_turn_on(config, request)
            })
            .await?;
        Ok(LightStatus::from_config(&config))
    }

    /// # Errors
    ///
    /// Same as [`RemoteService::light_turn_on`].
    #[tracing::instrument(skip(self))]
    pub async fn light_turn_off(&mut self, id: DeviceId) -> Result<LightStatus, IrHubError> {
        let config = self
            .execute(id, EntityKind::Light, light::plan_turn_off)
            .await?;
        Ok(LightStatus::from_config(&config))
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device has no enabled cover.
    pub fn cover_status(&self, id: DeviceId) -> Result<CoverStatus, IrHubError> {
        let (_, config) = active_entity(self.store.resolver(), id, EntityKind::Cover)?;
        Ok(CoverStatus::from_config(config))
    }

    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device has no enabled cover
    /// or a mapped command is missing, the blaster's error, or a storage
    /// error.
    #[tracing::instrument(skip(self))]
    pub async fn cover_open(&mut self, id: DeviceId) -> Result<CoverStatus, IrHubError> {
        let config = self.execute(id, EntityKind::Cover, cover::plan_open).await?;
        Ok(CoverStatus::from_config(&config))
    }

    /// # Errors
    ///
    /// Same as [`RemoteService::cover_open`].
    #[tracing::instrument(skip(self))]
    pub async fn cover_close(&mut self, id: DeviceId) -> Result<CoverStatus, IrHubError> {
        let config = self.execute(id, EntityKind::Cover, cover::plan_close).await?;
        Ok(CoverStatus::from_config(&config))
    }

    /// # Errors
    ///
    /// Same as [`RemoteService::cover_open`].
    #[tracing::instrument(skip(self))]
    pub async fn cover_stop(&mut self, id: DeviceId) -> Result<CoverStatus, IrHubError> {
        let config = self.execute(id, EntityKind::Cover, cover::plan_stop).await?;
        Ok(CoverStatus::from_config(&config))
    }
}
