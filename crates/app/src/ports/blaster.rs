//! Blaster port — transmit and capture through the physical IR/RF device.

use std::future::Future;
use std::time::Duration;

use irhub_domain::command::CommandType;
use irhub_domain::error::IrHubError;

/// Arguments of a capture (learning-mode) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Blaster that listens for the signal.
    pub blaster: String,
    /// Device label the blaster files the capture under.
    pub device_label: String,
    /// Command label the blaster files the capture under.
    pub command_label: String,
    pub command_type: CommandType,
    pub timeout: Duration,
}

/// A physical sender.
///
/// Transmissions are one-way: success only means the blaster accepted the
/// command, not that the appliance reacted.
pub trait Blaster: Send + Sync {
    /// Transmit `encoded` (already in transport form) once.
    fn send(
        &self,
        blaster: &str,
        encoded: &str,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send;

    /// Put the blaster in learning mode until a signal is captured or the
    /// request's timeout elapses.
    fn capture(
        &self,
        request: &CaptureRequest,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send;
}

impl<T: Blaster> Blaster for std::sync::Arc<T> {
    fn send(
        &self,
        blaster: &str,
        encoded: &str,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        (**self).send(blaster, encoded)
    }

    fn capture(
        &self,
        request: &CaptureRequest,
    ) -> impl Future<Output = Result<(), IrHubError>> + Send {
        (**self).capture(request)
    }
}
