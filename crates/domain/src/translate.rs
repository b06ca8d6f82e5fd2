//! Action translation: continuous targets to discrete levels or step counts,
//! and the ordered command plans handed to the dispatcher.
//!
//! Rounding is half-to-even throughout.

use serde::{Deserialize, Serialize};

/// Lowest colour temperature a preset list spans.
pub const MIN_KELVIN: u32 = 2000;
/// Highest colour temperature a preset list spans.
pub const MAX_KELVIN: u32 = 6500;
/// Reported colour temperature when no preset position can be derived.
pub const NEUTRAL_KELVIN: u32 = 4000;

/// Brightness range accepted by the translator.
pub const MIN_BRIGHTNESS: u8 = 1;
pub const MAX_BRIGHTNESS: u8 = 255;

/// How an entity adjusts a continuous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustMode {
    #[default]
    None,
    Discrete,
    Relative,
    Both,
}

/// The concrete way a single adjustment is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Discrete,
    Relative,
}

impl AdjustMode {
    /// Pick a strategy given which mappings exist.
    ///
    /// `Both` prefers discrete levels and falls back to relative stepping.
    #[must_use]
    pub fn resolve(self, has_levels: bool, has_relative: bool) -> Option<Strategy> {
        match self {
            Self::None => None,
            Self::Discrete => has_levels.then_some(Strategy::Discrete),
            Self::Relative => has_relative.then_some(Strategy::Relative),
            Self::Both if has_levels => Some(Strategy::Discrete),
            Self::Both => has_relative.then_some(Strategy::Relative),
        }
    }
}

/// Map `target` in `[lo, hi]` onto one of `n` evenly spaced levels.
///
/// `lo` may be greater than `hi` for inverted scales. Returns `None` when
/// there are no levels.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn discrete_index(target: f64, lo: f64, hi: f64, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let last = n - 1;
    if last == 0 || (hi - lo).abs() < f64::EPSILON {
        return Some(0);
    }
    let raw = ((target - lo) / (hi - lo) * last as f64).round_ties_even();
    Some(raw.clamp(0.0, last as f64) as usize)
}

/// Level index for a brightness in `1..=255`.
#[must_use]
pub fn brightness_level_index(brightness: u8, n: usize) -> Option<usize> {
    discrete_index(
        f64::from(brightness),
        f64::from(MIN_BRIGHTNESS),
        f64::from(MAX_BRIGHTNESS),
        n,
    )
}

/// Preset index for a colour temperature. Index 0 is the coolest preset.
#[must_use]
pub fn color_temp_level_index(kelvin: u32, n: usize) -> Option<usize> {
    discrete_index(
        f64::from(kelvin),
        f64::from(MAX_KELVIN),
        f64::from(MIN_KELVIN),
        n,
    )
}

/// Kelvin represented by preset `index` out of `n`.
///
/// Indices past the end are treated as the last preset.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn index_to_kelvin(index: usize, n: usize) -> u32 {
    if n <= 1 {
        return NEUTRAL_KELVIN;
    }
    let last = n - 1;
    let fraction = index.min(last) as f64 / last as f64;
    let span = f64::from(MAX_KELVIN - MIN_KELVIN);
    (f64::from(MAX_KELVIN) - fraction * span).trunc() as u32
}

/// Direction of a relative adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Number of `step`-sized presses needed to move from `current` to `target`.
///
/// Returns `None` when no press is needed.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn relative_steps(current: i64, target: i64, step: u32) -> Option<(Direction, u32)> {
    let diff = target - current;
    if diff == 0 || step == 0 {
        return None;
    }
    let count = (diff.unsigned_abs() as f64 / f64::from(step)).round_ties_even() as u32;
    if count == 0 {
        return None;
    }
    let direction = if diff > 0 {
        Direction::Up
    } else {
        Direction::Down
    };
    Some((direction, count))
}

/// One logical command send: `repeats` physical transmissions of `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommand {
    pub name: String,
    pub repeats: u32,
}

/// Ordered command names to transmit for one semantic action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandPlan(Vec<PlannedCommand>);

impl CommandPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single send of `name`.
    pub fn push(&mut self, name: impl Into<String>) {
        self.push_repeated(name, 1);
    }

    /// Append `repeats` sends of `name`. Zero repeats appends nothing.
    pub fn push_repeated(&mut self, name: impl Into<String>, repeats: u32) {
        if repeats > 0 {
            self.0.push(PlannedCommand {
                name: name.into(),
                repeats,
            });
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedCommand> {
        self.0.iter()
    }

    /// Total physical transmissions this plan performs.
    #[must_use]
    pub fn transmissions(&self) -> u32 {
        self.0.iter().map(|c| c.repeats).sum()
    }
}

impl<'a> IntoIterator for &'a CommandPlan {
    type Item = &'a PlannedCommand;
    type IntoIter = std::slice::Iter<'a, PlannedCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_pick_fourth_level_when_brightness_is_200_of_five() {
        assert_eq!(brightness_level_index(200, 5), Some(3));
    }

    #[test]
    fn should_hit_boundaries_for_any_level_count() {
        for n in 1..=12 {
            assert_eq!(brightness_level_index(1, n), Some(0));
            assert_eq!(brightness_level_index(255, n), Some(n - 1));
        }
    }

    #[test]
    fn should_be_monotonic_over_brightness_range() {
        for n in 1..=8 {
            let mut previous = 0;
            for b in 1..=255u8 {
                let idx = brightness_level_index(b, n).unwrap();
                assert!(idx >= previous, "n={n} b={b}");
                previous = idx;
            }
        }
    }

    #[test]
    fn should_return_none_when_no_levels() {
        assert_eq!(brightness_level_index(100, 0), None);
    }

    #[test]
    fn should_round_half_to_even() {
        assert_eq!(discrete_index(2.5, 0.0, 5.0, 6), Some(2));
        assert_eq!(discrete_index(3.5, 0.0, 5.0, 6), Some(4));
    }

    #[test]
    fn should_clamp_out_of_range_targets() {
        assert_eq!(discrete_index(-10.0, 0.0, 10.0, 3), Some(0));
        assert_eq!(discrete_index(99.0, 0.0, 10.0, 3), Some(2));
    }

    #[test]
    fn should_map_cool_kelvin_to_first_preset() {
        assert_eq!(color_temp_level_index(6500, 5), Some(0));
        assert_eq!(color_temp_level_index(2000, 5), Some(4));
        assert_eq!(color_temp_level_index(4250, 5), Some(2));
    }

    #[test]
    fn should_convert_index_back_to_kelvin() {
        assert_eq!(index_to_kelvin(0, 5), 6500);
        assert_eq!(index_to_kelvin(4, 5), 2000);
        assert_eq!(index_to_kelvin(1, 3), 4250);
        assert_eq!(index_to_kelvin(2, 1), NEUTRAL_KELVIN);
    }

    #[test]
    fn should_clamp_index_past_last_preset() {
        assert_eq!(index_to_kelvin(7, 3), MIN_KELVIN);
    }

    #[test]
    fn should_emit_no_steps_when_difference_is_zero() {
        assert_eq!(relative_steps(128, 128, 25), None);
    }

    #[test]
    fn should_count_steps_up_and_down() {
        assert_eq!(relative_steps(100, 200, 25), Some((Direction::Up, 4)));
        assert_eq!(relative_steps(4000, 2500, 500), Some((Direction::Down, 3)));
    }

    #[test]
    fn should_emit_nothing_when_difference_rounds_to_zero() {
        assert_eq!(relative_steps(100, 110, 25), None);
    }

    #[test]
    fn should_prefer_discrete_when_both_and_levels_present() {
        assert_eq!(AdjustMode::Both.resolve(true, true), Some(Strategy::Discrete));
        assert_eq!(AdjustMode::Both.resolve(false, true), Some(Strategy::Relative));
        assert_eq!(AdjustMode::Both.resolve(false, false), None);
    }

    #[test]
    fn should_not_fall_back_when_mode_is_explicit() {
        assert_eq!(AdjustMode::Discrete.resolve(false, true), None);
        assert_eq!(AdjustMode::Relative.resolve(true, false), None);
        assert_eq!(AdjustMode::None.resolve(true, true), None);
    }

    #[test]
    fn should_skip_zero_repeat_entries_in_plan() {
        let mut plan = CommandPlan::new();
        plan.push("power");
        plan.push_repeated("brightness_up", 0);
        plan.push_repeated("brightness_up", 3);
        assert_eq!(plan.iter().count(), 2);
        assert_eq!(plan.transmissions(), 4);
    }
}
