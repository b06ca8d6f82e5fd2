//! Virtual device: a named appliance bound to one physical blaster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::{IrCommand, command_key};
use crate::entity_config::{EntityConfig, EntityKind};
use crate::error::{DuplicateError, IrHubError, ValidationError};
use crate::id::DeviceId;
use crate::time::{Timestamp, now};

/// Which entity a device exposes besides its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Generic,
    Light,
    Cover,
    Fan,
}

impl DeviceType {
    /// Entity kind provisioned for this type; `None` for generic devices.
    #[must_use]
    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Generic => None,
            Self::Light => Some(EntityKind::Light),
            Self::Cover => Some(EntityKind::Cover),
            Self::Fan => Some(EntityKind::Fan),
        }
    }
}

impl std::str::FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            other => other
                .parse::<EntityKind>()
                .map(Self::from)
                .map_err(|_| ValidationError::UnknownVariant {
                    kind: "device type",
                    value: other.to_string(),
                }),
        }
    }
}

impl From<EntityKind> for DeviceType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Light => Self::Light,
            EntityKind::Cover => Self::Cover,
            EntityKind::Fan => Self::Fan,
        }
    }
}

/// A logical appliance controlled by replaying learned codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDevice {
    pub id: DeviceId,
    pub name: String,
    /// Identifier of the physical blaster that transmits for this device.
    #[serde(rename = "ir_blaster_entity_id")]
    pub blaster: String,
    /// Keyed by lowercased command name.
    #[serde(default)]
    pub commands: BTreeMap<String, IrCommand>,
    #[serde(default = "now")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub device_type: DeviceType,
    /// Keyed by entity type.
    #[serde(default)]
    pub entity_configs: BTreeMap<String, EntityConfig>,
}

impl VirtualDevice {
    /// Create a builder for constructing a [`VirtualDevice`].
    #[must_use]
    pub fn builder() -> VirtualDeviceBuilder {
        VirtualDeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when `name` or `blaster` is blank.
    pub fn validate(&self) -> Result<(), IrHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.blaster.trim().is_empty() {
            return Err(ValidationError::EmptyBlaster.into());
        }
        Ok(())
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        command_key(&self.name) == command_key(name)
    }

    /// Case-insensitive command lookup.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&IrCommand> {
        self.commands.get(&command_key(name))
    }

    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.command(name).is_some()
    }

    /// Add a command under its lowercased name.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateError`] when a command with the same name exists,
    /// compared case-insensitively. The device is left unchanged.
    pub fn insert_command(&mut self, command: IrCommand) -> Result<(), DuplicateError> {
        let key = command.key();
        if self.commands.contains_key(&key) {
            return Err(DuplicateError {
                entity: "Command",
                name: command.name,
            });
        }
        self.commands.insert(key, command);
        Ok(())
    }

    pub fn remove_command(&mut self, name: &str) -> Option<IrCommand> {
        self.commands.remove(&command_key(name))
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut IrCommand> {
        self.commands.get_mut(&command_key(name))
    }

    /// Switch the device type, provisioning a default config for the new
    /// type when none exists. Returns whether a config was provisioned.
    pub fn set_device_type(&mut self, device_type: DeviceType) -> bool {
        self.device_type = device_type;
        let Some(kind) = device_type.entity_kind() else {
            return false;
        };
        if self.entity_configs.contains_key(kind.as_str()) {
            return false;
        }
        self.entity_configs
            .insert(kind.as_str().to_string(), EntityConfig::default_for(kind));
        true
    }

    #[must_use]
    pub fn entity_config(&self, kind: EntityKind) -> Option<&EntityConfig> {
        self.entity_configs.get(kind.as_str())
    }

    pub fn entity_config_mut(&mut self, kind: EntityKind) -> Option<&mut EntityConfig> {
        self.entity_configs.get_mut(kind.as_str())
    }

    /// Replace the config for `kind`. Its `entity_type` is forced to match.
    pub fn set_entity_config(&mut self, kind: EntityKind, mut config: EntityConfig) {
        config.entity_type = kind.as_str().to_string();
        self.entity_configs.insert(kind.as_str().to_string(), config);
    }

    /// The config of the entity this device exposes as `kind`, if any.
    ///
    /// An entity exists only when the device type matches and its config is
    /// present and enabled.
    #[must_use]
    pub fn active_entity(&self, kind: EntityKind) -> Option<&EntityConfig> {
        if self.device_type.entity_kind() != Some(kind) {
            return None;
        }
        self.entity_config(kind).filter(|config| config.enabled)
    }

    /// Command display names, ordered by key.
    #[must_use]
    pub fn activity_list(&self) -> Vec<String> {
        self.commands.values().map(|c| c.name.clone()).collect()
    }
}

/// Step-by-step builder for [`VirtualDevice`].
#[derive(Debug, Default)]
pub struct VirtualDeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    blaster: Option<String>,
    created_at: Option<Timestamp>,
    device_type: DeviceType,
}

impl VirtualDeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn blaster(mut self, blaster: impl Into<String>) -> Self {
        self.blaster = Some(blaster.into());
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    /// Consume the builder, validate, and return a [`VirtualDevice`].
    ///
    /// A non-generic type provisions its default entity config.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] if `name` or `blaster` is missing
    /// or blank.
    pub fn build(self) -> Result<VirtualDevice, IrHubError> {
        let mut device = VirtualDevice {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            blaster: self.blaster.unwrap_or_default(),
            commands: BTreeMap::new(),
            created_at: self.created_at.unwrap_or_else(now),
            device_type: DeviceType::Generic,
            entity_configs: BTreeMap::new(),
        };
        device.validate()?;
        device.set_device_type(self.device_type);
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandCode;
    use crate::mapping::{CommandMappings, Slot};

    fn tv() -> VirtualDevice {
        VirtualDevice::builder()
            .name("Living Room TV")
            .blaster("remote.living_room")
            .build()
            .unwrap()
    }

    fn command(name: &str) -> IrCommand {
        IrCommand::builder()
            .name(name)
            .code(CommandCode::parse("JgBQAA==").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_generic_device_without_entity_configs() {
        let device = tv();
        assert_eq!(device.device_type, DeviceType::Generic);
        assert!(device.entity_configs.is_empty());
        assert!(device.commands.is_empty());
    }

    #[test]
    fn should_return_validation_error_when_blaster_missing() {
        let result = VirtualDevice::builder().name("TV").build();
        assert!(matches!(
            result,
            Err(IrHubError::Validation(ValidationError::EmptyBlaster))
        ));
    }

    #[test]
    fn should_return_validation_error_when_name_missing() {
        let result = VirtualDevice::builder().blaster("remote.x").build();
        assert!(matches!(
            result,
            Err(IrHubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_find_command_regardless_of_case() {
        let mut device = tv();
        device.insert_command(command("Volume_Up")).unwrap();
        assert!(device.has_command("VOLUME_UP"));
        assert!(device.commands.contains_key("volume_up"));
        assert_eq!(device.command("volume_up").unwrap().name, "Volume_Up");
    }

    #[test]
    fn should_reject_command_differing_only_in_case() {
        let mut device = tv();
        device.insert_command(command("Power")).unwrap();
        let err = device.insert_command(command("POWER")).unwrap_err();
        assert_eq!(err.name, "POWER");
        assert_eq!(device.commands.len(), 1);
    }

    #[test]
    fn should_remove_command_case_insensitively() {
        let mut device = tv();
        device.insert_command(command("Power")).unwrap();
        assert!(device.remove_command("power").is_some());
        assert!(device.remove_command("power").is_none());
    }

    #[test]
    fn should_provision_config_when_switching_type() {
        let mut device = tv();
        assert!(device.set_device_type(DeviceType::Light));
        assert!(device.entity_config(EntityKind::Light).is_some());
        assert!(device.active_entity(EntityKind::Light).is_some());
    }

    #[test]
    fn should_not_overwrite_existing_config_when_switching_type_again() {
        let mut device = tv();
        device.set_device_type(DeviceType::Light);
        let custom = EntityConfig::default_for(EntityKind::Light)
            .with_mappings(CommandMappings::new().with_single(Slot::TurnOn, "power"));
        device.set_entity_config(EntityKind::Light, custom.clone());

        device.set_device_type(DeviceType::Cover);
        assert!(!device.set_device_type(DeviceType::Light));
        assert_eq!(device.entity_config(EntityKind::Light), Some(&custom));
        assert!(device.entity_config(EntityKind::Cover).is_some());
    }

    #[test]
    fn should_hide_entity_when_type_differs_or_disabled() {
        let mut device = tv();
        device.set_device_type(DeviceType::Cover);
        device.set_entity_config(EntityKind::Light, EntityConfig::new(EntityKind::Light));
        assert!(device.active_entity(EntityKind::Light).is_none());

        let mut disabled = EntityConfig::default_for(EntityKind::Cover);
        disabled.enabled = false;
        device.set_entity_config(EntityKind::Cover, disabled);
        assert!(device.active_entity(EntityKind::Cover).is_none());
    }

    #[test]
    fn should_force_entity_type_when_setting_config() {
        let mut device = tv();
        let mut config = EntityConfig::new(EntityKind::Fan);
        config.entity_type = "light".into();
        device.set_entity_config(EntityKind::Fan, config);
        assert_eq!(
            device.entity_config(EntityKind::Fan).unwrap().entity_type,
            "fan"
        );
    }

    #[test]
    fn should_list_activities_by_display_name() {
        let mut device = tv();
        device.insert_command(command("Power")).unwrap();
        device.insert_command(command("HDMI_1")).unwrap();
        assert_eq!(device.activity_list(), ["HDMI_1", "Power"]);
    }

    #[test]
    fn should_compare_names_case_insensitively() {
        assert!(tv().is_named("living room tv"));
    }

    #[test]
    fn should_serialize_blaster_under_legacy_key() {
        let json = serde_json::to_value(tv()).unwrap();
        assert_eq!(json["ir_blaster_entity_id"], "remote.living_room");
        assert_eq!(json["device_type"], "generic");
    }

    #[test]
    fn should_parse_device_type() {
        assert_eq!("cover".parse::<DeviceType>().unwrap(), DeviceType::Cover);
        assert_eq!("generic".parse::<DeviceType>().unwrap(), DeviceType::Generic);
        assert!("toaster".parse::<DeviceType>().is_err());
    }
}
