//! Execution of command payloads against the managers they may touch.
//!
//! Each payload implements [`Execute`] for exactly one context type, so a
//! unit command cannot be handed the player manager and vice versa. The
//! result is the change notification to publish, or `None` when the command
//! was a no-op (missing target, kind mismatch, unlinked portal).

use log::debug;
use shared::command::{
    AddItem, AddPlayer, ChangePlayerAction, ChangePlayerHeldItem, CreateFenceUnit,
    CreateLinkUnit, CreatePortalUnit, CreateStaticUnit, MovePlayer, RemoveFenceUnit,
    RemoveLinkUnit, RemovePlayer, RemovePortalUnit, RemoveStaticUnit, RotateUnit,
    SendPlayerIntoPortal,
};
use shared::{Unit, UnitLocator, UnitType, WorldError};

use crate::events::WorldEvent;
use crate::item_manager::ItemManager;
use crate::player_manager::PlayerManager;
use crate::unit_manager::UnitManager;

pub type Outcome = Result<Option<WorldEvent>, WorldError>;

pub trait Execute<C> {
    fn execute(&self, context: C) -> Outcome;
}

pub struct PlayerContext<'a> {
    pub players: &'a mut PlayerManager,
}

pub struct UnitContext<'a> {
    pub units: &'a mut UnitManager,
}

/// Portal travel reads the unit grid and moves a player.
pub struct PortalContext<'a> {
    pub players: &'a mut PlayerManager,
    pub units: &'a UnitManager,
    /// Timestamp of the command being executed.
    pub timestamp: u64,
}

pub struct ItemContext<'a> {
    pub items: &'a mut ItemManager,
}

fn player_changed(change: Option<(shared::Player, shared::Player)>) -> Option<WorldEvent> {
    change.map(|(old, new)| WorldEvent::PlayerChanged { old, new })
}

impl Execute<PlayerContext<'_>> for AddPlayer {
    fn execute(&self, context: PlayerContext<'_>) -> Outcome {
        context.players.insert(self.player.clone())?;
        Ok(Some(WorldEvent::PlayerAdded(self.player.clone())))
    }
}

impl Execute<PlayerContext<'_>> for RemovePlayer {
    fn execute(&self, context: PlayerContext<'_>) -> Outcome {
        Ok(context
            .players
            .remove(&self.player_id)
            .map(WorldEvent::PlayerRemoved))
    }
}

impl Execute<PlayerContext<'_>> for MovePlayer {
    fn execute(&self, context: PlayerContext<'_>) -> Outcome {
        let change = context.players.update(&self.player_id, |player| {
            player.position = self.position;
            player.precise_position = self.position.to_precise();
            player.direction = self.direction;
        });
        Ok(player_changed(change))
    }
}

impl Execute<PlayerContext<'_>> for ChangePlayerAction {
    fn execute(&self, context: PlayerContext<'_>) -> Outcome {
        let change = context
            .players
            .update(&self.player_id, |player| player.apply_action(self.action));
        Ok(player_changed(change))
    }
}

impl Execute<PlayerContext<'_>> for ChangePlayerHeldItem {
    fn execute(&self, context: PlayerContext<'_>) -> Outcome {
        let change = context.players.update(&self.player_id, |player| {
            player.held_item_id = Some(self.item_id.clone());
        });
        Ok(player_changed(change))
    }
}

impl Execute<PortalContext<'_>> for SendPlayerIntoPortal {
    fn execute(&self, context: PortalContext<'_>) -> Outcome {
        let Some(target) = context
            .units
            .get_at(&self.position)
            .and_then(Unit::portal_target)
        else {
            debug!(
                "No linked portal at ({}, {}), player {} stays",
                self.position.x, self.position.z, self.player_id
            );
            return Ok(None);
        };

        let change = context.players.update(&self.player_id, |player| {
            player.teleport(target, context.timestamp);
        });
        Ok(player_changed(change))
    }
}

fn create_unit(units: &mut UnitManager, unit: Unit) -> Outcome {
    let placed = units.insert(unit.clone())?;
    Ok(placed.then_some(WorldEvent::UnitCreated(unit)))
}

impl Execute<UnitContext<'_>> for CreateStaticUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        create_unit(context.units, self.to_unit())
    }
}

impl Execute<UnitContext<'_>> for CreateFenceUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        create_unit(context.units, self.to_unit())
    }
}

impl Execute<UnitContext<'_>> for CreatePortalUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        create_unit(context.units, self.to_unit())
    }
}

impl Execute<UnitContext<'_>> for CreateLinkUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        create_unit(context.units, self.to_unit())
    }
}

fn remove_unit(units: &mut UnitManager, target: &UnitLocator, unit_type: UnitType) -> Outcome {
    Ok(units
        .remove_of_type(target, unit_type)
        .map(WorldEvent::UnitDeleted))
}

impl Execute<UnitContext<'_>> for RemoveStaticUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        remove_unit(context.units, &self.target, Self::UNIT_TYPE)
    }
}

impl Execute<UnitContext<'_>> for RemoveFenceUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        remove_unit(context.units, &self.target, Self::UNIT_TYPE)
    }
}

impl Execute<UnitContext<'_>> for RemovePortalUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        remove_unit(context.units, &self.target, Self::UNIT_TYPE)
    }
}

impl Execute<UnitContext<'_>> for RemoveLinkUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        remove_unit(context.units, &self.target, Self::UNIT_TYPE)
    }
}

impl Execute<UnitContext<'_>> for RotateUnit {
    fn execute(&self, context: UnitContext<'_>) -> Outcome {
        Ok(context
            .units
            .rotate(&self.target)
            .map(|(old, new)| WorldEvent::UnitUpdated { old, new }))
    }
}

impl Execute<ItemContext<'_>> for AddItem {
    fn execute(&self, context: ItemContext<'_>) -> Outcome {
        context.items.insert(self.item.clone());
        Ok(Some(WorldEvent::ItemAdded(self.item.clone())))
    }
}

/// Render perspective counter, never below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerspectiveDepth(u32);

impl PerspectiveDepth {
    pub fn new(depth: u32) -> Self {
        Self(depth)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn add(&mut self) -> Option<WorldEvent> {
        self.0 = self.0.saturating_add(1);
        Some(WorldEvent::PerspectiveDepthChanged(self.0))
    }

    pub fn subtract(&mut self) -> Option<WorldEvent> {
        if self.0 == 0 {
            return None;
        }
        self.0 -= 1;
        Some(WorldEvent::PerspectiveDepthChanged(self.0))
    }
}
