//! Command mappings: semantic slots bound to learned command names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known semantic slots an entity config can map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    TurnOn,
    TurnOff,
    Toggle,
    BrightnessLevels,
    BrightnessUp,
    BrightnessDown,
    ColorTempLevels,
    ColorTempUp,
    ColorTempDown,
    Effects,
    Open,
    Close,
    Stop,
}

impl Slot {
    /// Key under which this slot is persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Toggle => "toggle",
            Self::BrightnessLevels => "brightness_levels",
            Self::BrightnessUp => "brightness_up",
            Self::BrightnessDown => "brightness_down",
            Self::ColorTempLevels => "color_temp_levels",
            Self::ColorTempUp => "color_temp_up",
            Self::ColorTempDown => "color_temp_down",
            Self::Effects => "effects",
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a slot points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingValue {
    /// One command, e.g. `turn_on`.
    Single(String),
    /// Ordered discrete levels, e.g. `brightness_levels`.
    Levels(Vec<String>),
    /// Display name to command, e.g. `effects`.
    Named(BTreeMap<String, String>),
    /// Anything else is kept as-is so it survives a rewrite.
    Json(serde_json::Value),
}

/// All slot bindings of one entity config, keyed by slot name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandMappings(BTreeMap<String, MappingValue>);

impl CommandMappings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `slot` to `value`, replacing any previous binding.
    #[must_use]
    pub fn with(mut self, slot: Slot, value: MappingValue) -> Self {
        self.0.insert(slot.as_str().to_string(), value);
        self
    }

    /// Bind `slot` to a single command name.
    #[must_use]
    pub fn with_single(self, slot: Slot, command: impl Into<String>) -> Self {
        self.with(slot, MappingValue::Single(command.into()))
    }

    /// Bind `slot` to an ordered list of command names.
    #[must_use]
    pub fn with_levels<I, S>(self, slot: Slot, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(
            slot,
            MappingValue::Levels(commands.into_iter().map(Into::into).collect()),
        )
    }

    /// Bind `slot` to named commands.
    #[must_use]
    pub fn with_named<I, K, V>(self, slot: Slot, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with(
            slot,
            MappingValue::Named(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        )
    }

    /// The single command bound to `slot`, if any. Blank names count as unbound.
    #[must_use]
    pub fn single(&self, slot: Slot) -> Option<&str> {
        match self.0.get(slot.as_str()) {
            Some(MappingValue::Single(name)) if !name.is_empty() => Some(name.as_str()),
            _ => None,
        }
    }

    /// The discrete levels bound to `slot`; empty when unbound.
    #[must_use]
    pub fn levels(&self, slot: Slot) -> &[String] {
        match self.0.get(slot.as_str()) {
            Some(MappingValue::Levels(levels)) => levels,
            _ => &[],
        }
    }

    /// The named commands bound to `slot`, if any.
    #[must_use]
    pub fn named(&self, slot: Slot) -> Option<&BTreeMap<String, String>> {
        match self.0.get(slot.as_str()) {
            Some(MappingValue::Named(named)) => Some(named),
            _ => None,
        }
    }

    /// `single(first)`, falling back to `single(second)`.
    #[must_use]
    pub fn single_or(&self, first: Slot, second: Slot) -> Option<&str> {
        self.single(first).or_else(|| self.single(second))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
