//! Learned IR/RF commands and their base64 payloads.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

use crate::error::{IrHubError, ValidationError};
use crate::id::CommandId;
use crate::time::{Timestamp, now};

/// Prefix some blasters expect in front of a base64 payload.
pub const TRANSPORT_PREFIX: &str = "b64:";

/// Standard padded base64 that ignores non-zero bits in the last symbol.
const CODE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Normalise a command name into its storage key.
///
/// Command names are unique per device regardless of case, so every map
/// keyed by command name uses the lowercased form.
#[must_use]
pub fn command_key(name: &str) -> String {
    name.to_lowercase()
}

/// Carrier of a learned signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    #[default]
    Ir,
    Rf,
}

impl CommandType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ir => "ir",
            Self::Rf => "rf",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ir" => Ok(Self::Ir),
            "rf" => Ok(Self::Rf),
            other => Err(ValidationError::UnknownVariant {
                kind: "command type",
                value: other.to_string(),
            }),
        }
    }
}

/// A validated base64 payload, stored without any transport prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandCode(String);

impl CommandCode {
    /// Validate a raw code, stripping a leading `b64:` if present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCode`] when nothing follows the
    /// prefix, and [`ValidationError::InvalidEncoding`] when the remaining
    /// text is not standard padded base64.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.strip_prefix(TRANSPORT_PREFIX).unwrap_or(raw);
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        CODE_ENGINE
            .decode(code)
            .map_err(ValidationError::InvalidEncoding)?;
        Ok(Self(code.to_string()))
    }

    /// The stored base64 text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form handed to a blaster: `b64:<code>`.
    #[must_use]
    pub fn to_transport(&self) -> String {
        format!("{TRANSPORT_PREFIX}{}", self.0)
    }
}

impl TryFrom<String> for CommandCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CommandCode> for String {
    fn from(code: CommandCode) -> Self {
        code.0
    }
}

/// A single learned code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrCommand {
    pub id: CommandId,
    pub name: String,
    pub code: CommandCode,
    #[serde(default)]
    pub command_type: CommandType,
    #[serde(default = "now")]
    pub learned_at: Timestamp,
    #[serde(default)]
    pub icon: Option<String>,
}

impl IrCommand {
    /// Create a builder for constructing an [`IrCommand`].
    #[must_use]
    pub fn builder() -> IrCommandBuilder {
        IrCommandBuilder::default()
    }

    /// The lowercased key this command is stored under.
    #[must_use]
    pub fn key(&self) -> String {
        command_key(&self.name)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), IrHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`IrCommand`].
#[derive(Debug, Default)]
pub struct IrCommandBuilder {
    id: Option<CommandId>,
    name: Option<String>,
    code: Option<CommandCode>,
    command_type: CommandType,
    learned_at: Option<Timestamp>,
    icon: Option<String>,
}

impl IrCommandBuilder {
    #[must_use]
    pub fn id(mut self, id: CommandId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn code(mut self, code: CommandCode) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub fn command_type(mut self, command_type: CommandType) -> Self {
        self.command_type = command_type;
        self
    }

    #[must_use]
    pub fn learned_at(mut self, ts: Timestamp) -> Self {
        self.learned_at = Some(ts);
        self
    }

    /// Set the display icon. An empty string means "no icon".
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icon = (!icon.is_empty()).then_some(icon);
        self
    }

    /// Consume the builder, validate, and return an [`IrCommand`].
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] if the name is blank or no code
    /// was provided.
    pub fn build(self) -> Result<IrCommand, IrHubError> {
        let code = self.code.ok_or(ValidationError::EmptyCode)?;
        let command = IrCommand {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            code,
            command_type: self.command_type,
            learned_at: self.learned_at.unwrap_or_else(now),
            icon: self.icon,
        };
        command.validate()?;
        Ok(command)
    }
}
