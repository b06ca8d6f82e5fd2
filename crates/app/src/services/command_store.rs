//! Command store — the aggregate root holding every virtual device.
//!
//! Each mutation is applied in memory and then persisted immediately. When
//! persisting fails the in-memory change stays applied and the error is
//! returned, so the caller can retry with [`CommandStore::save`].

use std::collections::BTreeMap;

use irhub_domain::command::IrCommand;
use irhub_domain::device::{DeviceType, VirtualDevice};
use irhub_domain::document;
use irhub_domain::entity_config::{EntityConfig, EntityKind};
use irhub_domain::error::{DuplicateError, IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;
use serde_json::{Map, Value};

use crate::ports::DocumentStore;
use crate::services::resolver::CommandResolver;

/// Devices loaded from a [`DocumentStore`], kept in sync with it.
pub struct CommandStore<S> {
    storage: S,
    devices: BTreeMap<DeviceId, VirtualDevice>,
}

fn storage_error(err: impl std::error::Error + Send + Sync + 'static) -> IrHubError {
    IrHubError::Storage(Box::new(err))
}

fn device_not_found(id: DeviceId) -> IrHubError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}

impl<S: DocumentStore> CommandStore<S> {
    /// Restore the store, migrating the stored document when it is older
    /// than the current schema.
    ///
    /// Records that fail to decode are skipped with a warning. A migrated
    /// document is written back once so later loads skip the migration.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Storage`] when the document cannot be read, is
    /// not an object, comes from a newer schema, or the migrated document
    /// cannot be written back.
    #[tracing::instrument(skip(storage))]
    pub async fn load(storage: S) -> Result<Self, IrHubError> {
        let Some(raw) = storage.load().await? else {
            tracing::info!("no stored document, starting empty");
            return Ok(Self {
                storage,
                devices: BTreeMap::new(),
            });
        };

        let migration = document::migrate(raw).map_err(storage_error)?;
        let decoded = document::decode(&migration.document);
        for failure in &decoded.failures {
            tracing::warn!(record = %failure.key, error = %failure.error, "skipping unreadable device record");
        }
        if migration.changed() {
            tracing::info!(
                from = migration.from_version,
                to = document::STORE_VERSION,
                "migrated stored document"
            );
            storage.save(migration.document).await?;
        }
        tracing::info!(devices = decoded.devices.len(), "command store loaded");

        Ok(Self {
            storage,
            devices: decoded.devices,
        })
    }

    /// Read-only lookups over the current snapshot.
    #[must_use]
    pub fn resolver(&self) -> CommandResolver<'_> {
        CommandResolver::new(&self.devices)
    }

    /// Persist the full current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Storage`] when encoding or writing fails.
    pub async fn save(&self) -> Result<(), IrHubError> {
        let snapshot = document::encode(self.devices.values()).map_err(storage_error)?;
        self.storage.save(snapshot).await
    }

    fn device_mut(&mut self, id: DeviceId) -> Result<&mut VirtualDevice, IrHubError> {
        self.devices.get_mut(&id).ok_or_else(|| device_not_found(id))
    }

    /// Add a device whose name is not used yet (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when the device is invalid,
    /// [`IrHubError::Duplicate`] on a name clash, or a storage error.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn add_device(&mut self, device: VirtualDevice) -> Result<VirtualDevice, IrHubError> {
        device.validate()?;
        if self.resolver().get_device_by_name(&device.name).is_some() {
            return Err(DuplicateError {
                entity: "Device",
                name: device.name,
            }
            .into());
        }
        self.devices.insert(device.id, device.clone());
        tracing::info!(device_id = %device.id, "device created");
        self.save().await?;
        Ok(device)
    }

    /// Remove a device. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails.
    #[tracing::instrument(skip(self))]
    pub async fn remove_device(&mut self, id: DeviceId) -> Result<bool, IrHubError> {
        let Some(device) = self.devices.remove(&id) else {
            return Ok(false);
        };
        tracing::info!(device_name = %device.name, "device removed");
        self.save().await?;
        Ok(true)
    }

    /// Add a command to a device.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for an unknown device,
    /// [`IrHubError::Duplicate`] when the name exists (case-insensitive), or a
    /// storage error.
    #[tracing::instrument(skip(self, command), fields(command_name = %command.name))]
    pub async fn add_command(
        &mut self,
        device_id: DeviceId,
        command: IrCommand,
    ) -> Result<IrCommand, IrHubError> {
        command.validate()?;
        let device = self.device_mut(device_id)?;
        device.insert_command(command.clone())?;
        tracing::info!(device_name = %device.name, "command added");
        self.save().await?;
        Ok(command)
    }

    /// Delete a command from a device.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or the command is
    /// absent, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_command(
        &mut self,
        device_id: DeviceId,
        name: &str,
    ) -> Result<IrCommand, IrHubError> {
        let device = self.device_mut(device_id)?;
        let removed = device.remove_command(name).ok_or_else(|| NotFoundError {
            entity: "Command",
            id: name.to_string(),
        })?;
        tracing::info!(device_name = %device.name, "command deleted");
        self.save().await?;
        Ok(removed)
    }

    /// Set or clear a command's icon, the only in-place command update.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or the command is
    /// absent, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn update_command_icon(
        &mut self,
        device_id: DeviceId,
        name: &str,
        icon: Option<String>,
    ) -> Result<IrCommand, IrHubError> {
        let device = self.device_mut(device_id)?;
        let command = device.command_mut(name).ok_or_else(|| NotFoundError {
            entity: "Command",
            id: name.to_string(),
        })?;
        command.icon = icon.filter(|icon| !icon.is_empty());
        let updated = command.clone();
        self.save().await?;
        Ok(updated)
    }

    /// Switch a device's type, provisioning the default config if needed.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for an unknown device, or a storage
    /// error.
    #[tracing::instrument(skip(self))]
    pub async fn set_device_type(
        &mut self,
        device_id: DeviceId,
        device_type: DeviceType,
    ) -> Result<VirtualDevice, IrHubError> {
        let device = self.device_mut(device_id)?;
        if device.set_device_type(device_type) {
            tracing::debug!(device_name = %device.name, "provisioned default entity config");
        }
        let updated = device.clone();
        self.save().await?;
        Ok(updated)
    }

    /// Replace the entity config of `kind` on a device.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for an unknown device, or a storage
    /// error.
    #[tracing::instrument(skip(self, config))]
    pub async fn set_entity_config(
        &mut self,
        device_id: DeviceId,
        kind: EntityKind,
        config: EntityConfig,
    ) -> Result<VirtualDevice, IrHubError> {
        let device = self.device_mut(device_id)?;
        device.set_entity_config(kind, config);
        let updated = device.clone();
        self.save().await?;
        Ok(updated)
    }

    /// Write back an entity's assumed state.
    ///
    /// Silently does nothing when the device or the config is absent and
    /// returns whether something was written.
    ///
    /// # Errors
    ///
    /// Returns a storage error when persisting fails.
    pub async fn save_entity_state(
        &mut self,
        device_id: DeviceId,
        kind: EntityKind,
        state: Map<String, Value>,
    ) -> Result<bool, IrHubError> {
        let Some(config) = self
            .devices
            .get_mut(&device_id)
            .and_then(|device| device.entity_config_mut(kind))
        else {
            return Ok(false);
        };
        config.state = state;
        self.save().await?;
        Ok(true)
    }
}
