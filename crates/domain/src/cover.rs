//! Cover actions: open, close, stop with an assumed position.

use serde::Serialize;

use crate::capability::CoverCapabilities;
use crate::entity_config::{CoverState, EntityConfig};
use crate::mapping::Slot;
use crate::translate::CommandPlan;

const OPEN: u8 = 100;
const CLOSED: u8 = 0;
const MIDWAY: u8 = 50;

/// Commands to send plus the resulting assumed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPlan {
    pub commands: CommandPlan,
    pub state: CoverState,
}

fn plan_for(config: &EntityConfig, slot: Slot, state: CoverState) -> CoverPlan {
    let mut commands = CommandPlan::new();
    if let Some(cmd) = config.command_mappings.single(slot) {
        commands.push(cmd);
    }
    CoverPlan { commands, state }
}

#[must_use]
pub fn plan_open(config: &EntityConfig) -> CoverPlan {
    plan_for(
        config,
        Slot::Open,
        CoverState {
            position: OPEN,
            is_closed: Some(false),
        },
    )
}

#[must_use]
pub fn plan_close(config: &EntityConfig) -> CoverPlan {
    plan_for(
        config,
        Slot::Close,
        CoverState {
            position: CLOSED,
            is_closed: Some(true),
        },
    )
}

/// A stop from a fully open or closed position lands somewhere unknown, so
/// the position is assumed midway. Any other position is kept.
#[must_use]
pub fn plan_stop(config: &EntityConfig) -> CoverPlan {
    let mut state = config.cover_state();
    if state.position == OPEN || state.position == CLOSED {
        state = CoverState {
            position: MIDWAY,
            is_closed: None,
        };
    }
    plan_for(config, Slot::Stop, state)
}

/// What a cover reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverStatus {
    pub position: u8,
    pub is_closed: Option<bool>,
    pub device_class: String,
    pub capabilities: CoverCapabilities,
}

impl CoverStatus {
    #[must_use]
    pub fn from_config(config: &EntityConfig) -> Self {
        let state = config.cover_state();
        Self {
            position: state.position,
            is_closed: state.is_closed,
            device_class: config.cover_options().device_class,
            capabilities: CoverCapabilities::from_config(config),
        }
    }
}
