//! Per entity-type configuration: command mappings, options and assumed state.
//!
//! `state` and `options` are stored as free-form JSON objects. The typed views
//! below read them leniently (missing or malformed keys fall back to
//! defaults) and write back only the keys they own, so keys written by other
//! versions survive.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ValidationError;
use crate::mapping::CommandMappings;
use crate::translate::AdjustMode;

/// Entity types a virtual device can expose beyond its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Light,
    Cover,
    Fan,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Cover => "cover",
            Self::Fan => "fan",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "cover" => Ok(Self::Cover),
            "fan" => Ok(Self::Fan),
            other => Err(ValidationError::UnknownVariant {
                kind: "entity type",
                value: other.to_string(),
            }),
        }
    }
}

/// Behaviour configuration for one entity type of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Kept as text so configs for types this build does not know still load.
    #[serde(default)]
    pub entity_type: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub command_mappings: CommandMappings,
    #[serde(default)]
    pub state: Map<String, Value>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

fn enabled_by_default() -> bool {
    true
}

impl EntityConfig {
    /// An empty, enabled config for `kind`.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            entity_type: kind.as_str().to_string(),
            enabled: true,
            command_mappings: CommandMappings::default(),
            state: Map::new(),
            options: Map::new(),
        }
    }

    /// The config provisioned when a device switches to `kind`.
    #[must_use]
    pub fn default_for(kind: EntityKind) -> Self {
        let (state, options) = match kind {
            EntityKind::Light => (
                json!({"is_on": false, "brightness": 255, "color_temp_index": 2}),
                json!({"brightness_mode": "none"}),
            ),
            EntityKind::Cover => (json!({"position": 50}), json!({"device_class": "shade"})),
            EntityKind::Fan => (json!({"is_on": false, "speed": 50}), json!({})),
        };
        Self {
            state: into_object(state),
            options: into_object(options),
            ..Self::new(kind)
        }
    }

    #[must_use]
    pub fn with_mappings(mut self, mappings: CommandMappings) -> Self {
        self.command_mappings = mappings;
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn light_options(&self) -> LightOptions {
        LightOptions::from_map(&self.options)
    }

    #[must_use]
    pub fn light_state(&self) -> LightState {
        LightState::from_map(&self.state)
    }

    #[must_use]
    pub fn cover_options(&self) -> CoverOptions {
        CoverOptions::from_map(&self.options)
    }

    #[must_use]
    pub fn cover_state(&self) -> CoverState {
        CoverState::from_map(&self.state)
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn u64_or(map: &Map<String, Value>, key: &str, default: u64) -> u64 {
    map.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn parse_or_default<T: for<'de> Deserialize<'de> + Default>(
    map: &Map<String, Value>,
    key: &str,
) -> T {
    map.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

/// Typed view of a light's `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightOptions {
    pub brightness_mode: AdjustMode,
    /// Brightness units (of 255) moved by one relative step.
    pub brightness_step_size: u32,
    /// Kelvin moved by one relative colour-temperature step.
    pub color_temp_step_kelvin: u32,
}

impl Default for LightOptions {
    fn default() -> Self {
        Self {
            brightness_mode: AdjustMode::None,
            brightness_step_size: 25,
            color_temp_step_kelvin: 500,
        }
    }
}

impl LightOptions {
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            brightness_mode: parse_or_default(map, "brightness_mode"),
            brightness_step_size: u32::try_from(u64_or(
                map,
                "brightness_step_size",
                u64::from(defaults.brightness_step_size),
            ))
            .unwrap_or(defaults.brightness_step_size)
            .max(1),
            color_temp_step_kelvin: u32::try_from(u64_or(
                map,
                "color_temp_step_kelvin",
                u64::from(defaults.color_temp_step_kelvin),
            ))
            .unwrap_or(defaults.color_temp_step_kelvin)
            .max(1),
        }
    }
}

/// Typed view of a light's assumed `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightState {
    pub is_on: bool,
    /// 1..=255.
    pub brightness: u8,
    /// Index into the colour-temperature presets.
    pub color_temp_index: usize,
    /// Assumed Kelvin after relative stepping; absent until the first step.
    pub color_temp_kelvin: Option<u32>,
    pub effect: Option<String>,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            is_on: false,
            brightness: 255,
            color_temp_index: 2,
            color_temp_kelvin: None,
            effect: None,
        }
    }
}

impl LightState {
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            is_on: map
                .get("is_on")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.is_on),
            brightness: u8::try_from(u64_or(map, "brightness", 255).clamp(1, 255))
                .unwrap_or(defaults.brightness),
            color_temp_index: usize::try_from(u64_or(map, "color_temp_index", 2))
                .unwrap_or(defaults.color_temp_index),
            color_temp_kelvin: map
                .get("color_temp_kelvin")
                .and_then(Value::as_u64)
                .and_then(|k| u32::try_from(k).ok()),
            effect: map
                .get("effect")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Write the owned keys into `map`, leaving every other key untouched.
    pub fn write_into(&self, map: &mut Map<String, Value>) {
        map.insert("is_on".into(), self.is_on.into());
        map.insert("brightness".into(), self.brightness.into());
        map.insert("color_temp_index".into(), self.color_temp_index.into());
        match self.color_temp_kelvin {
            Some(k) => map.insert("color_temp_kelvin".into(), k.into()),
            None => map.remove("color_temp_kelvin"),
        };
        map.insert(
            "effect".into(),
            self.effect.clone().map_or(Value::Null, Value::String),
        );
    }
}

/// Typed view of a cover's `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverOptions {
    pub device_class: String,
}

impl CoverOptions {
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            device_class: map
                .get("device_class")
                .and_then(Value::as_str)
                .unwrap_or("shade")
                .to_string(),
        }
    }
}

/// Typed view of a cover's assumed `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverState {
    /// 0 = closed, 100 = open.
    pub position: u8,
    /// `None` when unknown.
    pub is_closed: Option<bool>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            position: 50,
            is_closed: None,
        }
    }
}

impl CoverState {
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            position: u8::try_from(u64_or(map, "position", 50).min(100)).unwrap_or(50),
            is_closed: map.get("is_closed").and_then(Value::as_bool),
        }
    }

    /// Write the owned keys into `map`, leaving every other key untouched.
    pub fn write_into(&self, map: &mut Map<String, Value>) {
        map.insert("position".into(), self.position.into());
        map.insert(
            "is_closed".into(),
            self.is_closed.map_or(Value::Null, Value::Bool),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_provision_light_defaults() {
        let config = EntityConfig::default_for(EntityKind::Light);
        assert!(config.enabled);
        assert!(config.command_mappings.is_empty());
        assert_eq!(config.light_options().brightness_mode, AdjustMode::None);
        let state = config.light_state();
        assert!(!state.is_on);
        assert_eq!(state.brightness, 255);
        assert_eq!(state.color_temp_index, 2);
    }

    #[test]
    fn should_provision_cover_defaults() {
        let config = EntityConfig::default_for(EntityKind::Cover);
        assert_eq!(config.cover_state().position, 50);
        assert_eq!(config.cover_options().device_class, "shade");
    }

    #[test]
    fn should_provision_fan_defaults() {
        let config = EntityConfig::default_for(EntityKind::Fan);
        assert_eq!(config.state.get("speed"), Some(&json!(50)));
        assert!(config.options.is_empty());
    }

    #[test]
    fn should_fall_back_to_defaults_when_options_malformed() {
        let config = EntityConfig::new(EntityKind::Light)
            .with_option("brightness_mode", "sideways")
            .with_option("brightness_step_size", "big");
        let options = config.light_options();
        assert_eq!(options, LightOptions::default());
    }

    #[test]
    fn should_read_configured_light_options() {
        let config = EntityConfig::new(EntityKind::Light)
            .with_option("brightness_mode", "relative")
            .with_option("brightness_step_size", 50)
            .with_option("color_temp_step_kelvin", 250);
        let options = config.light_options();
        assert_eq!(options.brightness_mode, AdjustMode::Relative);
        assert_eq!(options.brightness_step_size, 50);
        assert_eq!(options.color_temp_step_kelvin, 250);
    }

    #[test]
    fn should_keep_foreign_state_keys_when_writing_light_state() {
        let mut config =
            EntityConfig::new(EntityKind::Light).with_state("vendor_hint", "keep me");
        let state = LightState {
            is_on: true,
            effect: Some("Party".into()),
            ..LightState::default()
        };
        state.write_into(&mut config.state);
        assert_eq!(config.state.get("vendor_hint"), Some(&json!("keep me")));
        assert_eq!(config.state.get("effect"), Some(&json!("Party")));
        assert_eq!(config.light_state(), state);
    }

    #[test]
    fn should_write_null_when_cover_closure_unknown() {
        let mut map = Map::new();
        CoverState::default().write_into(&mut map);
        assert_eq!(map.get("is_closed"), Some(&Value::Null));
        assert_eq!(map.get("position"), Some(&json!(50)));
    }

    #[test]
    fn should_default_enabled_when_missing_from_json() {
        let config: EntityConfig = serde_json::from_value(json!({"entity_type": "light"})).unwrap();
        assert!(config.enabled);
    }

    #[test]
    fn should_reject_unknown_entity_kind() {
        assert!("sprinkler".parse::<EntityKind>().is_err());
    }
}
