//! Light actions: turn on/off with brightness, colour temperature and effect.
//!
//! Planners are pure. They read the config, return the commands to send and
//! the assumed state to persist once those commands went out.

use serde::{Deserialize, Serialize};

use crate::capability::{ColorMode, LightCapabilities};
use crate::entity_config::{EntityConfig, LightState};
use crate::mapping::Slot;
use crate::translate::{
    AdjustMode, CommandPlan, Direction, MAX_KELVIN, MIN_BRIGHTNESS, MIN_KELVIN,
    NEUTRAL_KELVIN, Strategy, brightness_level_index, color_temp_level_index, index_to_kelvin,
    relative_steps,
};

/// Optional adjustments applied after powering on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TurnOn {
    #[serde(default)]
    pub brightness: Option<u8>,
    #[serde(default)]
    pub color_temp_kelvin: Option<u32>,
    #[serde(default)]
    pub effect: Option<String>,
}

/// Commands to send plus the resulting assumed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightPlan {
    pub commands: CommandPlan,
    pub state: LightState,
}

/// Plan a turn-on with optional adjustments.
///
/// Each adjustment is independent and skipped when the light does not
/// support it or has nothing mapped for it.
#[must_use]
pub fn plan_turn_on(config: &EntityConfig, request: &TurnOn) -> LightPlan {
    let mappings = &config.command_mappings;
    let caps = LightCapabilities::from_config(config);
    let mut state = config.light_state();
    let mut commands = CommandPlan::new();

    if !state.is_on {
        if let Some(cmd) = mappings.single_or(Slot::TurnOn, Slot::Toggle) {
            commands.push(cmd);
        }
        state.is_on = true;
    }

    if let Some(target) = request.brightness.filter(|_| caps.brightness) {
        apply_brightness(config, target.max(MIN_BRIGHTNESS), &mut state, &mut commands);
    }

    if let Some(target) = request.color_temp_kelvin.filter(|_| caps.color_temp) {
        apply_color_temp(
            config,
            target.clamp(MIN_KELVIN, MAX_KELVIN),
            &mut state,
            &mut commands,
        );
    }

    if let Some(effect) = &request.effect {
        if let Some(cmd) = mappings
            .named(Slot::Effects)
            .and_then(|effects| effects.get(effect))
        {
            commands.push(cmd.clone());
            state.effect = Some(effect.clone());
        }
    }

    LightPlan { commands, state }
}

/// Plan a turn-off. The effect is cleared regardless of what was sent.
#[must_use]
pub fn plan_turn_off(config: &EntityConfig) -> LightPlan {
    let mut state = config.light_state();
    let mut commands = CommandPlan::new();
    if let Some(cmd) = config
        .command_mappings
        .single_or(Slot::TurnOff, Slot::Toggle)
    {
        commands.push(cmd);
    }
    state.is_on = false;
    state.effect = None;
    LightPlan { commands, state }
}

fn apply_brightness(
    config: &EntityConfig,
    target: u8,
    state: &mut LightState,
    commands: &mut CommandPlan,
) {
    let mappings = &config.command_mappings;
    let options = config.light_options();
    let levels = mappings.levels(Slot::BrightnessLevels);
    let up = mappings.single(Slot::BrightnessUp);
    let down = mappings.single(Slot::BrightnessDown);

    match options
        .brightness_mode
        .resolve(!levels.is_empty(), up.is_some() && down.is_some())
    {
        Some(Strategy::Discrete) => {
            if let Some(idx) = brightness_level_index(target, levels.len()) {
                commands.push(levels[idx].clone());
            }
        }
        Some(Strategy::Relative) => {
            let step = relative_steps(
                i64::from(state.brightness),
                i64::from(target),
                options.brightness_step_size,
            );
            if let (Some((direction, count)), Some(up), Some(down)) = (step, up, down) {
                let cmd = match direction {
                    Direction::Up => up,
                    Direction::Down => down,
                };
                commands.push_repeated(cmd, count);
            }
        }
        None => {}
    }
    state.brightness = target;
}

fn apply_color_temp(
    config: &EntityConfig,
    target: u32,
    state: &mut LightState,
    commands: &mut CommandPlan,
) {
    let mappings = &config.command_mappings;
    let levels = mappings.levels(Slot::ColorTempLevels);
    let up = mappings.single(Slot::ColorTempUp);
    let down = mappings.single(Slot::ColorTempDown);

    // Colour temperature has no mode option; it uses whatever is mapped.
    match AdjustMode::Both.resolve(!levels.is_empty(), up.is_some() && down.is_some()) {
        Some(Strategy::Discrete) => {
            if let Some(idx) = color_temp_level_index(target, levels.len()) {
                commands.push(levels[idx].clone());
                state.color_temp_index = idx;
                state.color_temp_kelvin = None;
            }
        }
        Some(Strategy::Relative) => {
            let step_kelvin = config.light_options().color_temp_step_kelvin;
            let current = current_kelvin(config, state);
            let Some((direction, count)) =
                relative_steps(i64::from(current), i64::from(target), step_kelvin)
            else {
                return;
            };
            let (Some(up), Some(down)) = (up, down) else {
                return;
            };
            let moved = count.saturating_mul(step_kelvin);
            let (cmd, kelvin) = match direction {
                Direction::Up => (up, current.saturating_add(moved)),
                Direction::Down => (down, current.saturating_sub(moved)),
            };
            commands.push_repeated(cmd, count);
            state.color_temp_kelvin = Some(kelvin.clamp(MIN_KELVIN, MAX_KELVIN));
        }
        None => {}
    }
}

/// Assumed colour temperature, from the preset index when presets exist,
/// otherwise from the tracked Kelvin.
fn current_kelvin(config: &EntityConfig, state: &LightState) -> u32 {
    let n = config.command_mappings.levels(Slot::ColorTempLevels).len();
    if n > 0 {
        index_to_kelvin(state.color_temp_index, n)
    } else {
        state.color_temp_kelvin.unwrap_or(NEUTRAL_KELVIN)
    }
}

/// What a light reports: its capabilities and assumed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightStatus {
    pub is_on: bool,
    pub brightness: Option<u8>,
    pub color_temp_kelvin: Option<u32>,
    pub min_color_temp_kelvin: u32,
    pub max_color_temp_kelvin: u32,
    pub effect: Option<String>,
    pub color_mode: ColorMode,
    pub capabilities: LightCapabilities,
}

impl LightStatus {
    #[must_use]
    pub fn from_config(config: &EntityConfig) -> Self {
        let capabilities = LightCapabilities::from_config(config);
        let state = config.light_state();
        Self {
            is_on: state.is_on,
            brightness: capabilities.brightness.then_some(state.brightness),
            color_temp_kelvin: capabilities
                .color_temp
                .then(|| current_kelvin(config, &state)),
            min_color_temp_kelvin: MIN_KELVIN,
            max_color_temp_kelvin: MAX_KELVIN,
            effect: state.effect,
            color_mode: capabilities.color_mode(),
            capabilities,
        }
    }
}
