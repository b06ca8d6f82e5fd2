//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts them into
//! [`IrHubError`] via `#[from]` (or a `From` impl in adapter crates).

/// Root error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum IrHubError {
    /// Input rejected before any state mutation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A device or command is absent.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A device or command name collides with an existing one.
    #[error(transparent)]
    Duplicate(#[from] DuplicateError),

    /// The blaster could not capture a code (including timeouts).
    #[error("capture failed")]
    CaptureFailed(#[from] CaptureError),

    /// The blaster rejected or failed to transmit a command.
    #[error("blaster error")]
    Blaster(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The persisted document could not be read or written.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Reasons an input is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("blaster reference must not be empty")]
    EmptyBlaster,

    #[error("command code must not be empty")]
    EmptyCode,

    #[error("command code is not valid base64")]
    InvalidEncoding(#[source] base64::DecodeError),

    #[error("learn timeout must be between {min} and {max} seconds, got {actual}")]
    TimeoutOutOfRange { min: u64, max: u64, actual: u64 },

    #[error("repeat count must be between {min} and {max}, got {actual}")]
    RepeatsOutOfRange { min: u32, max: u32, actual: u32 },

    #[error("delay must be a finite, non-negative number of seconds")]
    InvalidDelay,

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A name that already exists (compared case-insensitively).
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{name}' already exists")]
pub struct DuplicateError {
    pub entity: &'static str,
    pub name: String,
}

/// Why a capture did not produce a code on the blaster.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no signal received within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("blaster reported: {0}")]
    Rejected(String),
}
