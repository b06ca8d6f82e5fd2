//! Dispatcher — turns command names into blaster transmissions.
//!
//! Every transmission is awaited before the next starts: IR cannot overlap,
//! so nothing here is ever sent concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use irhub_domain::command::IrCommand;
use irhub_domain::device::VirtualDevice;
use irhub_domain::error::{IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;
use irhub_domain::translate::CommandPlan;
use serde::Serialize;

use crate::ports::Blaster;

/// Outcome of a multi-command send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Display names of the commands that went out, in order.
    pub sent: Vec<String>,
    /// Requested names with no matching command on the device.
    pub skipped: Vec<String>,
}

/// Sends commands through a [`Blaster`] and remembers the last one per device.
pub struct Dispatcher<B> {
    blaster: Arc<B>,
    last_sent: HashMap<DeviceId, String>,
}

fn command_not_found(name: &str) -> IrHubError {
    NotFoundError {
        entity: "Command",
        id: name.to_string(),
    }
    .into()
}

impl<B: Blaster> Dispatcher<B> {
    pub fn new(blaster: B) -> Self {
        Self {
            blaster: Arc::new(blaster),
            last_sent: HashMap::new(),
        }
    }

    /// A handle on the blaster that outlives a borrow of the dispatcher.
    #[must_use]
    pub fn blaster(&self) -> Arc<B> {
        Arc::clone(&self.blaster)
    }

    /// Name of the last logical command sent to a device.
    #[must_use]
    pub fn last_sent(&self, device_id: DeviceId) -> Option<&str> {
        self.last_sent.get(&device_id).map(String::as_str)
    }

    /// Drop what is remembered about a removed device.
    pub fn forget(&mut self, device_id: DeviceId) {
        self.last_sent.remove(&device_id);
    }

    async fn transmit(
        &mut self,
        device: &VirtualDevice,
        command: &IrCommand,
        repeats: u32,
    ) -> Result<(), IrHubError> {
        let payload = command.code.to_transport();
        for _ in 0..repeats {
            self.blaster.send(&device.blaster, &payload).await?;
        }
        tracing::debug!(
            device_name = %device.name,
            command_name = %command.name,
            blaster = %device.blaster,
            repeats,
            "sent command"
        );
        self.last_sent.insert(device.id, command.name.clone());
        Ok(())
    }

    /// Send one logical command `repeats` times in a row.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device has no such command,
    /// or the blaster's error.
    pub async fn send_command(
        &mut self,
        device: &VirtualDevice,
        name: &str,
        repeats: u32,
    ) -> Result<(), IrHubError> {
        let command = device.command(name).ok_or_else(|| command_not_found(name))?;
        self.transmit(device, command, repeats).await
    }

    /// Send every planned command in order.
    ///
    /// All names are resolved before the first transmission, so an unknown
    /// name sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] for the first unknown name, or the
    /// blaster's error.
    pub async fn send_plan(
        &mut self,
        device: &VirtualDevice,
        plan: &CommandPlan,
    ) -> Result<(), IrHubError> {
        let resolved = plan
            .iter()
            .map(|planned| {
                device
                    .command(&planned.name)
                    .map(|command| (command, planned.repeats))
                    .ok_or_else(|| command_not_found(&planned.name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (command, repeats) in resolved {
            self.transmit(device, command, repeats).await?;
        }
        Ok(())
    }

    /// Send a list of commands, skipping unknown names.
    ///
    /// `delay` is waited between two sent commands, never after the last.
    ///
    /// # Errors
    ///
    /// Returns the blaster's error; commands already sent stay sent.
    pub async fn send_batch(
        &mut self,
        device: &VirtualDevice,
        names: &[String],
        repeats: u32,
        delay: Option<Duration>,
    ) -> Result<BatchReport, IrHubError> {
        let mut report = BatchReport::default();
        for name in names {
            let Some(command) = device.command(name) else {
                tracing::warn!(
                    device_name = %device.name,
                    command_name = %name,
                    "command not found on device, skipping"
                );
                report.skipped.push(name.clone());
                continue;
            };
            if let Some(delay) = delay.filter(|_| !report.sent.is_empty()) {
                tokio::time::sleep(delay).await;
            }
            self.transmit(device, command, repeats).await?;
            report.sent.push(command.name.clone());
        }
        Ok(report)
    }
}
