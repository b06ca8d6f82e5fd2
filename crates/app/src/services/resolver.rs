//! Command resolver — pure lookups over a store snapshot.

use std::collections::BTreeMap;

use irhub_domain::command::IrCommand;
use irhub_domain::device::VirtualDevice;
use irhub_domain::error::{IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;

/// Borrowed, read-only view of the devices held by a
/// [`CommandStore`](crate::services::command_store::CommandStore).
///
/// Name comparisons are case-insensitive everywhere.
#[derive(Clone, Copy)]
pub struct CommandResolver<'a> {
    devices: &'a BTreeMap<DeviceId, VirtualDevice>,
}

impl<'a> CommandResolver<'a> {
    #[must_use]
    pub fn new(devices: &'a BTreeMap<DeviceId, VirtualDevice>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> impl Iterator<Item = &'a VirtualDevice> + use<'a> {
        self.devices.values()
    }

    /// Look up a device by id.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when no device has this id.
    pub fn get_device(&self, id: DeviceId) -> Result<&'a VirtualDevice, IrHubError> {
        self.devices.get(&id).ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Linear scan for a device by name.
    #[must_use]
    pub fn get_device_by_name(&self, name: &str) -> Option<&'a VirtualDevice> {
        self.devices.values().find(|device| device.is_named(name))
    }

    /// Whether `name` exists on the device. Unknown devices have no commands.
    #[must_use]
    pub fn command_exists(&self, device_id: DeviceId, name: &str) -> bool {
        self.devices
            .get(&device_id)
            .is_some_and(|device| device.has_command(name))
    }

    /// Look up a command on a device.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or the command is
    /// absent.
    pub fn get_command(&self, device_id: DeviceId, name: &str) -> Result<&'a IrCommand, IrHubError> {
        self.get_device(device_id)?.command(name).ok_or_else(|| {
            NotFoundError {
                entity: "Command",
                id: name.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use irhub_domain::command::CommandCode;

    use super::*;

    fn snapshot() -> (DeviceId, BTreeMap<DeviceId, VirtualDevice>) {
        let mut tv = VirtualDevice::builder()
            .name("Living Room TV")
            .blaster("remote.living_room")
            .build()
            .unwrap();
        tv.insert_command(
            IrCommand::builder()
                .name("Volume_Up")
                .code(CommandCode::parse("JgBQAA==").unwrap())
                .build()
                .unwrap(),
        )
        .unwrap();
        let id = tv.id;
        (id, BTreeMap::from([(id, tv)]))
    }

    #[test]
    fn should_find_device_by_name_case_insensitively() {
        let (id, devices) = snapshot();
        let resolver = CommandResolver::new(&devices);
        assert_eq!(resolver.get_device_by_name("living room tv").unwrap().id, id);
        assert!(resolver.get_device_by_name("Kitchen").is_none());
    }

    #[test]
    fn should_report_command_existence_case_insensitively() {
        let (id, devices) = snapshot();
        let resolver = CommandResolver::new(&devices);
        assert!(resolver.command_exists(id, "VOLUME_UP"));
        assert!(!resolver.command_exists(id, "mute"));
        assert!(!resolver.command_exists(DeviceId::new(), "volume_up"));
    }

    #[test]
    fn should_return_not_found_for_unknown_device() {
        let (_, devices) = snapshot();
        let resolver = CommandResolver::new(&devices);
        assert!(matches!(
            resolver.get_device(DeviceId::new()),
            Err(IrHubError::NotFound(_))
        ));
    }

    #[test]
    fn should_return_not_found_for_unknown_command() {
        let (id, devices) = snapshot();
        let resolver = CommandResolver::new(&devices);
        let err = resolver.get_command(id, "mute").unwrap_err();
        assert_eq!(err.to_string(), "Command 'mute' not found");
    }
}
