//! The world-journey orchestrator.
//!
//! [`WorldJourneyService`] owns the player, unit and item managers of one
//! world visit and is the single entry point through which they change:
//! every mutation is a [`Command`] passed to [`WorldJourneyService::execute_command`],
//! whether it came from the local user or from the server.
//!
//! Locally initiated actions (`make_player_walk`, `create_unit`, ...) build a
//! command, apply it right away and only then hand it to the outbound
//! [`CommandSink`], so the local view never lags the local action. Commands
//! that fail locally are not broadcast.
//!
//! After a `MovePlayer` or `ChangePlayerAction` lands the local player on a
//! portal, the service synthesizes a `SendPlayerIntoPortal` command, applies
//! it and sends it as well.
//!
//! The server echoes our own commands back at their place in the global
//! order, and they are applied again there so every replica runs the same
//! sequence. Re-applying an own command does not run the portal hook a
//! second time. A rotation is the one command that would compound when
//! applied twice; its echo is skipped since rotations of a unit commute.

use log::{debug, info, warn};
use std::collections::HashSet;
use uuid::Uuid;
use shared::command::{
    ChangePlayerAction, ChangePlayerHeldItem, CreateFenceUnit, CreateLinkUnit, CreatePortalUnit,
    CreateStaticUnit, MovePlayer, RemoveFenceUnit, RemoveLinkUnit, RemovePortalUnit,
    RemoveStaticUnit, RotateUnit, SendPlayerIntoPortal,
};
use shared::unit::UnitVisitor;
use shared::{
    dispatch_unit_type, Command, CommandKind, Direction, Item, ItemId, Player, PlayerAction,
    PlayerId, Position, PrecisePosition, Unit, UnitLocator, UnitType, UnitTypeHandlers, World,
    WorldError, WorldSnapshot,
};

use crate::commands::{
    Execute, ItemContext, PerspectiveDepth, PlayerContext, PortalContext, UnitContext,
};
use crate::config::EngineConfig;
use crate::events::{EventBus, SubscriptionId, WorldEvent, WorldEventKind};
use crate::item_manager::ItemManager;
use crate::player_manager::PlayerManager;
use crate::sink::CommandSink;
use crate::unit_manager::UnitManager;

pub struct WorldJourneyService {
    world: World,
    my_player_id: PlayerId,
    player_manager: PlayerManager,
    unit_manager: UnitManager,
    item_manager: ItemManager,
    perspective_depth: PerspectiveDepth,
    config: EngineConfig,
    events: EventBus,
    sink: Box<dyn CommandSink>,
    /// Ids of commands we sent whose echo has not arrived yet.
    issued: HashSet<Uuid>,
    destroyed: bool,
}

/// Whether applying `kind` a second time leaves the world as applying it
/// once did.
fn reapplies_cleanly(kind: &CommandKind) -> bool {
    match kind {
        CommandKind::RotateUnit(_)
        | CommandKind::AddPerspectiveDepth
        | CommandKind::SubtractPerspectiveDepth => false,
        CommandKind::AddPlayer(_)
        | CommandKind::RemovePlayer(_)
        | CommandKind::MovePlayer(_)
        | CommandKind::ChangePlayerAction(_)
        | CommandKind::ChangePlayerHeldItem(_)
        | CommandKind::SendPlayerIntoPortal(_)
        | CommandKind::CreateStaticUnit(_)
        | CommandKind::CreateFenceUnit(_)
        | CommandKind::CreatePortalUnit(_)
        | CommandKind::CreateLinkUnit(_)
        | CommandKind::RemoveStaticUnit(_)
        | CommandKind::RemoveFenceUnit(_)
        | CommandKind::RemovePortalUnit(_)
        | CommandKind::RemoveLinkUnit(_)
        | CommandKind::AddItem(_) => true,
    }
}

impl WorldJourneyService {
    /// Builds the service from the world-entry snapshot. The local player
    /// designation is fixed for the lifetime of the service.
    pub fn new(snapshot: WorldSnapshot, config: EngineConfig, sink: Box<dyn CommandSink>) -> Self {
        let (unit_manager, rejected) = UnitManager::new(snapshot.units);
        for err in rejected {
            warn!("Dropped unit from world snapshot: {}", err);
        }

        let mut item_manager = ItemManager::new(snapshot.items);
        let referenced: Vec<ItemId> = unit_manager.units().map(|u| u.item_id.clone()).collect();
        let placeholders = item_manager.track_placeholders(&referenced);

        let player_manager = PlayerManager::new(snapshot.players);

        info!(
            "Entered world {} as player {} ({} players, {} units, {} unresolved items)",
            snapshot.world.id,
            snapshot.my_player_id,
            player_manager.len(),
            unit_manager.len(),
            placeholders.len()
        );

        Self {
            world: snapshot.world,
            my_player_id: snapshot.my_player_id,
            player_manager,
            unit_manager,
            item_manager,
            perspective_depth: PerspectiveDepth::new(config.perspective_depth),
            config,
            events: EventBus::new(),
            sink,
            issued: HashSet::new(),
            destroyed: false,
        }
    }

    /// Applies one command and publishes what changed.
    ///
    /// Invariant violations (occupied cell, duplicate player) are logged and
    /// returned; the command is dropped and the world stays as it was.
    pub fn execute_command(&mut self, command: &Command) -> Result<(), WorldError> {
        let own_echo = self.issued.remove(&command.id());
        if own_echo && !reapplies_cleanly(command.kind()) {
            debug!("Echo of own {} ({}) already applied", command.name(), command.id());
            return Ok(());
        }

        let portal = self.apply_command(command)?;
        if !own_echo {
            self.enter_portal(portal);
        }
        Ok(())
    }

    /// Applies one command without running the portal hook. Returns the
    /// portal command the move calls for, if any.
    fn apply_command(&mut self, command: &Command) -> Result<Option<Command>, WorldError> {
        let outcome = match command.kind() {
            CommandKind::AddPlayer(c) => c.execute(PlayerContext {
                players: &mut self.player_manager,
            }),
            CommandKind::RemovePlayer(c) => c.execute(PlayerContext {
                players: &mut self.player_manager,
            }),
            CommandKind::MovePlayer(c) => c.execute(PlayerContext {
                players: &mut self.player_manager,
            }),
            CommandKind::ChangePlayerAction(c) => c.execute(PlayerContext {
                players: &mut self.player_manager,
            }),
            CommandKind::ChangePlayerHeldItem(c) => c.execute(PlayerContext {
                players: &mut self.player_manager,
            }),
            CommandKind::SendPlayerIntoPortal(c) => c.execute(PortalContext {
                players: &mut self.player_manager,
                units: &self.unit_manager,
                timestamp: command.timestamp(),
            }),
            CommandKind::CreateStaticUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::CreateFenceUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::CreatePortalUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::CreateLinkUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::RemoveStaticUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::RemoveFenceUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::RemovePortalUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::RemoveLinkUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::RotateUnit(c) => c.execute(UnitContext {
                units: &mut self.unit_manager,
            }),
            CommandKind::AddItem(c) => c.execute(ItemContext {
                items: &mut self.item_manager,
            }),
            CommandKind::AddPerspectiveDepth => Ok(self.perspective_depth.add()),
            CommandKind::SubtractPerspectiveDepth => Ok(self.perspective_depth.subtract()),
        };

        let event = match outcome {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropped command {} ({}): {}", command.name(), command.id(), e);
                return Err(e);
            }
        };

        let Some(event) = event else {
            debug!("Command {} ({}) changed nothing", command.name(), command.id());
            return Ok(None);
        };
        debug!("Applied command {} ({})", command.name(), command.id());

        let moved = match (command.kind(), &event) {
            (
                CommandKind::MovePlayer(_) | CommandKind::ChangePlayerAction(_),
                WorldEvent::PlayerChanged { old, new },
            ) => Some((old.position, new.clone())),
            _ => None,
        };

        self.publish(event);

        Ok(moved.and_then(|(old_position, player)| self.portal_command(old_position, &player)))
    }

    fn publish(&mut self, event: WorldEvent) {
        let follow_up = match &event {
            WorldEvent::UnitCreated(unit) => {
                let discovered = self.item_manager.track_placeholders([&unit.item_id]);
                (!discovered.is_empty()).then(|| WorldEvent::PlaceholderItemIdsAdded(discovered))
            }
            WorldEvent::PlayerChanged { old, new } if new.id == self.my_player_id => {
                Some(WorldEvent::MyPlayerChanged {
                    old: old.clone(),
                    new: new.clone(),
                })
            }
            _ => None,
        };

        if self.destroyed {
            return;
        }
        self.events.publish(&event);
        if let Some(follow_up) = follow_up {
            self.events.publish(&follow_up);
        }
    }

    /// Post-commit hook for player movement: stepping onto a portal sends
    /// the local player through it.
    fn portal_command(&self, old_position: Position, player: &Player) -> Option<Command> {
        if player.id != self.my_player_id || player.position == old_position {
            return None;
        }

        let unit = self.unit_manager.get_at(&player.position)?;
        if unit.unit_type() != UnitType::Portal {
            return None;
        }

        info!(
            "Player {} stepped onto portal at ({}, {})",
            player.id, player.position.x, player.position.z
        );
        Some(Command::new(SendPlayerIntoPortal {
            player_id: player.id.clone(),
            position: player.position,
        }))
    }

    fn enter_portal(&mut self, portal: Option<Command>) {
        if let Some(command) = portal {
            if self.apply_command(&command).is_ok() {
                self.send(&command);
            }
        }
    }

    /// Executes a locally built command, then broadcasts it ahead of any
    /// portal travel it triggered.
    fn issue(&mut self, command: Command) -> Result<(), WorldError> {
        let portal = self.apply_command(&command)?;
        self.send(&command);
        self.enter_portal(portal);
        Ok(())
    }

    fn send(&mut self, command: &Command) {
        self.issued.insert(command.id());
        self.sink.send_command(command);
    }

    pub fn make_player_stand(&mut self, now: u64) -> Result<(), WorldError> {
        let me = self.get_my_player()?;
        let origin = me.precise_position_at(now, self.config.walk_speed);
        let command = Command::new(ChangePlayerAction {
            player_id: me.id.clone(),
            action: PlayerAction::stand(origin, me.direction, now),
        });
        self.issue(command)
    }

    pub fn make_player_walk(&mut self, direction: Direction, now: u64) -> Result<(), WorldError> {
        let me = self.get_my_player()?;
        let origin = me.precise_position_at(now, self.config.walk_speed);
        let command = Command::new(ChangePlayerAction {
            player_id: me.id.clone(),
            action: PlayerAction::walk(origin, direction, now),
        });
        self.issue(command)
    }

    pub fn move_my_player(&mut self, position: Position, direction: Direction) -> Result<(), WorldError> {
        let command = Command::new(MovePlayer {
            player_id: self.get_my_player()?.id.clone(),
            position,
            direction,
        });
        self.issue(command)
    }

    pub fn change_player_held_item(&mut self, item_id: ItemId) -> Result<(), WorldError> {
        let command = Command::new(ChangePlayerHeldItem {
            player_id: self.get_my_player()?.id.clone(),
            item_id,
        });
        self.issue(command)
    }

    /// Places the held item in front of the local player, facing back at
    /// it. `link_url` is only used when the item becomes a link unit.
    pub fn create_unit(&mut self, link_url: &str) -> Result<(), WorldError> {
        let Some(item) = self.get_my_player_held_item() else {
            debug!("No resolved held item, nothing to place");
            return Ok(());
        };
        let item_id = item.id.clone();
        let unit_type = item.compatible_unit_type;

        let me = self.get_my_player()?;
        let position = me.forward_position(1);
        let direction = me.direction.opposite();

        let kind: CommandKind = dispatch_unit_type(
            unit_type,
            UnitTypeHandlers {
                static_: || CreateStaticUnit::new(item_id.clone(), position, direction).into(),
                fence: || CreateFenceUnit::new(item_id.clone(), position, direction).into(),
                portal: || CreatePortalUnit::new(item_id.clone(), position, direction, None).into(),
                link: || CreateLinkUnit::new(item_id.clone(), position, direction, link_url).into(),
            },
        );
        self.issue(Command::new(kind))
    }

    /// Removes the unit in front of the local player.
    pub fn remove_unit(&mut self) -> Result<(), WorldError> {
        let Some(unit) = self.get_unit_in_front()? else {
            return Ok(());
        };
        let target = UnitLocator::Id(unit.id.clone());

        let kind: CommandKind = dispatch_unit_type(
            unit.unit_type(),
            UnitTypeHandlers {
                static_: || RemoveStaticUnit { target: target.clone() }.into(),
                fence: || RemoveFenceUnit { target: target.clone() }.into(),
                portal: || RemovePortalUnit { target: target.clone() }.into(),
                link: || RemoveLinkUnit { target: target.clone() }.into(),
            },
        );
        self.issue(Command::new(kind))
    }

    /// Turns the unit in front of the local player one step clockwise.
    pub fn rotate_unit(&mut self) -> Result<(), WorldError> {
        let Some(unit) = self.get_unit_in_front()? else {
            return Ok(());
        };
        let command = Command::new(RotateUnit {
            target: UnitLocator::Id(unit.id.clone()),
        });
        self.issue(command)
    }

    /// The URL behind the link unit in front of the local player, if any.
    pub fn engage_unit(&self) -> Result<Option<String>, WorldError> {
        struct LinkUrl;

        impl UnitVisitor for LinkUrl {
            type Output = Option<String>;

            fn visit_static(&mut self, _unit: &Unit) -> Self::Output {
                None
            }

            fn visit_fence(&mut self, _unit: &Unit) -> Self::Output {
                None
            }

            fn visit_portal(&mut self, _unit: &Unit, _target: Option<&Position>) -> Self::Output {
                None
            }

            fn visit_link(&mut self, _unit: &Unit, url: &str) -> Self::Output {
                Some(url.to_string())
            }
        }

        Ok(self
            .get_unit_in_front()?
            .and_then(|unit| unit.visit(&mut LinkUrl)))
    }

    /// Local only; the perspective is a per-viewer setting.
    pub fn add_perspective_depth(&mut self) -> Result<(), WorldError> {
        self.execute_command(&Command::new(CommandKind::AddPerspectiveDepth))
    }

    /// Local only; never goes below zero.
    pub fn subtract_perspective_depth(&mut self) -> Result<(), WorldError> {
        self.execute_command(&Command::new(CommandKind::SubtractPerspectiveDepth))
    }

    pub fn subscribe<F>(&mut self, kind: WorldEventKind, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&WorldEvent) + 'static,
    {
        self.events.subscribe(kind, Box::new(subscriber))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Stops all callback delivery. Applied state is kept. Safe to call
    /// more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.events.clear();
        self.destroyed = true;
        info!("World journey in {} destroyed", self.world.id);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn my_player_id(&self) -> &PlayerId {
        &self.my_player_id
    }

    /// The local player. Fails only if the world has not delivered it yet.
    pub fn get_my_player(&self) -> Result<&Player, WorldError> {
        self.player_manager.get(&self.my_player_id)
    }

    pub fn get_player(&self, id: &PlayerId) -> Option<&Player> {
        self.player_manager.find(id)
    }

    pub fn get_players(&self) -> Vec<&Player> {
        self.player_manager.players().collect()
    }

    pub fn get_other_players(&self) -> Vec<&Player> {
        self.player_manager
            .players()
            .filter(|player| player.id != self.my_player_id)
            .collect()
    }

    pub fn get_player_precise_position(&self, id: &PlayerId, now: u64) -> Option<PrecisePosition> {
        self.player_manager
            .find(id)
            .map(|player| player.precise_position_at(now, self.config.walk_speed))
    }

    pub fn get_unit(&self, position: &Position) -> Option<&Unit> {
        self.unit_manager.get_at(position)
    }

    pub fn get_units(&self) -> Vec<&Unit> {
        self.unit_manager.units().collect()
    }

    fn get_unit_in_front(&self) -> Result<Option<&Unit>, WorldError> {
        let position = self.get_my_player()?.forward_position(1);
        Ok(self.unit_manager.get_at(&position))
    }

    pub fn get_item(&self, id: &ItemId) -> Option<&Item> {
        self.item_manager.get(id)
    }

    pub fn get_items(&self) -> Vec<&Item> {
        self.item_manager.items().collect()
    }

    /// The catalog entry of what the local player holds, once resolved.
    pub fn get_my_player_held_item(&self) -> Option<&Item> {
        let held = self.get_my_player().ok()?.held_item_id.as_ref()?;
        self.item_manager.get(held)
    }

    pub fn get_placeholder_item_ids(&self) -> Vec<ItemId> {
        self.item_manager.placeholder_item_ids().cloned().collect()
    }

    pub fn get_perspective_depth(&self) -> u32 {
        self.perspective_depth.get()
    }
}
