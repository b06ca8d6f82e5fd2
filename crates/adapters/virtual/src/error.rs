use irhub_domain::error::IrHubError;

/// Failures the virtual blaster simulates.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VirtualBlasterError {
    /// The blaster reference is not one this instance answers for.
    #[error("unknown blaster '{0}'")]
    UnknownBlaster(String),
}

impl From<VirtualBlasterError> for IrHubError {
    fn from(err: VirtualBlasterError) -> Self {
        Self::Blaster(Box::new(err))
    }
}
