//! Capability mapper: which high-level features a config supports.
//!
//! Capabilities are a pure function of `command_mappings` and `options` and
//! are recomputed on every call.

use serde::Serialize;

use crate::entity_config::EntityConfig;
use crate::mapping::Slot;
use crate::translate::AdjustMode;

/// Colour mode a light reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[serde(rename = "onoff")]
    OnOff,
    Brightness,
    ColorTemp,
}

/// Features a light config supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightCapabilities {
    pub brightness: bool,
    pub color_temp: bool,
    /// Effect names, sorted.
    pub effects: Vec<String>,
}

impl LightCapabilities {
    #[must_use]
    pub fn from_config(config: &EntityConfig) -> Self {
        let mappings = &config.command_mappings;
        let brightness = config.light_options().brightness_mode != AdjustMode::None
            && (!mappings.levels(Slot::BrightnessLevels).is_empty()
                || mappings.single(Slot::BrightnessUp).is_some());
        let color_temp = !mappings.levels(Slot::ColorTempLevels).is_empty()
            || mappings.single(Slot::ColorTempUp).is_some();
        let effects = mappings
            .named(Slot::Effects)
            .map(|named| named.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            brightness,
            color_temp,
            effects,
        }
    }

    #[must_use]
    pub fn supports_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Colour temperature wins over brightness, which wins over on/off.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        if self.color_temp {
            ColorMode::ColorTemp
        } else if self.brightness {
            ColorMode::Brightness
        } else {
            ColorMode::OnOff
        }
    }
}

/// Features a cover config supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverCapabilities {
    pub open: bool,
    pub close: bool,
    pub stop: bool,
}

impl CoverCapabilities {
    #[must_use]
    pub fn from_config(config: &EntityConfig) -> Self {
        let mappings = &config.command_mappings;
        Self {
            open: mappings.single(Slot::Open).is_some(),
            close: mappings.single(Slot::Close).is_some(),
            stop: mappings.single(Slot::Stop).is_some(),
        }
    }
}
