//! Broadlink configuration errors.

use irhub_domain::error::IrHubError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BroadlinkError {
    /// The configured address is not 12 hex digits once separators are removed.
    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),
}

impl From<BroadlinkError> for IrHubError {
    fn from(err: BroadlinkError) -> Self {
        Self::Blaster(Box::new(err))
    }
}
