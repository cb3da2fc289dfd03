//! The closed set of world mutations.
//!
//! A [`Command`] is an immutable envelope (identity, timestamp) around one
//! [`CommandKind`]. Commands issued locally get a fresh identity through
//! [`Command::new`]; commands rebuilt from the wire keep the issuer's
//! identity through [`Command::load`].

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::ids::{ItemId, PlayerId, UnitId};
use crate::item::Item;
use crate::player::{Player, PlayerAction};
use crate::position::{Direction, Position};
use crate::unit::{Unit, UnitKind, UnitLocator, UnitType};

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Current wall clock in milliseconds since the Unix epoch.
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Wall clock milliseconds, strictly increasing across calls in this process.
pub fn next_timestamp() -> u64 {
    let now = get_timestamp();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    id: Uuid,
    timestamp: u64,
    kind: CommandKind,
}

impl Command {
    /// A locally issued command with a fresh identity and timestamp.
    pub fn new(kind: impl Into<CommandKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: next_timestamp(),
            kind: kind.into(),
        }
    }

    /// A command rebuilt with the identity its issuer gave it.
    pub fn load(id: Uuid, timestamp: u64, kind: impl Into<CommandKind>) -> Self {
        Self {
            id,
            timestamp,
            kind: kind.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandKind {
    AddPlayer(AddPlayer),
    RemovePlayer(RemovePlayer),
    MovePlayer(MovePlayer),
    ChangePlayerAction(ChangePlayerAction),
    ChangePlayerHeldItem(ChangePlayerHeldItem),
    SendPlayerIntoPortal(SendPlayerIntoPortal),
    CreateStaticUnit(CreateStaticUnit),
    CreateFenceUnit(CreateFenceUnit),
    CreatePortalUnit(CreatePortalUnit),
    CreateLinkUnit(CreateLinkUnit),
    RemoveStaticUnit(RemoveStaticUnit),
    RemoveFenceUnit(RemoveFenceUnit),
    RemovePortalUnit(RemovePortalUnit),
    RemoveLinkUnit(RemoveLinkUnit),
    RotateUnit(RotateUnit),
    AddItem(AddItem),
    AddPerspectiveDepth,
    SubtractPerspectiveDepth,
}

impl CommandKind {
    /// Wire discriminant of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::AddPlayer(_) => "ADD_PLAYER",
            CommandKind::RemovePlayer(_) => "REMOVE_PLAYER",
            CommandKind::MovePlayer(_) => "MOVE_PLAYER",
            CommandKind::ChangePlayerAction(_) => "CHANGE_PLAYER_ACTION",
            CommandKind::ChangePlayerHeldItem(_) => "CHANGE_PLAYER_HELD_ITEM",
            CommandKind::SendPlayerIntoPortal(_) => "SEND_PLAYER_INTO_PORTAL",
            CommandKind::CreateStaticUnit(_) => "CREATE_STATIC_UNIT",
            CommandKind::CreateFenceUnit(_) => "CREATE_FENCE_UNIT",
            CommandKind::CreatePortalUnit(_) => "CREATE_PORTAL_UNIT",
            CommandKind::CreateLinkUnit(_) => "CREATE_LINK_UNIT",
            CommandKind::RemoveStaticUnit(_) => "REMOVE_STATIC_UNIT",
            CommandKind::RemoveFenceUnit(_) => "REMOVE_FENCE_UNIT",
            CommandKind::RemovePortalUnit(_) => "REMOVE_PORTAL_UNIT",
            CommandKind::RemoveLinkUnit(_) => "REMOVE_LINK_UNIT",
            CommandKind::RotateUnit(_) => "ROTATE_UNIT",
            CommandKind::AddItem(_) => "ADD_ITEM",
            CommandKind::AddPerspectiveDepth => "ADD_PERSPECTIVE_DEPTH",
            CommandKind::SubtractPerspectiveDepth => "SUBTRACT_PERSPECTIVE_DEPTH",
        }
    }
}

macro_rules! impl_into_kind {
    ($($payload:ident),* $(,)?) => {
        $(
            impl From<$payload> for CommandKind {
                fn from(payload: $payload) -> Self {
                    CommandKind::$payload(payload)
                }
            }
        )*
    };
}

impl_into_kind!(
    AddPlayer,
    RemovePlayer,
    MovePlayer,
    ChangePlayerAction,
    ChangePlayerHeldItem,
    SendPlayerIntoPortal,
    CreateStaticUnit,
    CreateFenceUnit,
    CreatePortalUnit,
    CreateLinkUnit,
    RemoveStaticUnit,
    RemoveFenceUnit,
    RemovePortalUnit,
    RemoveLinkUnit,
    RotateUnit,
    AddItem,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPlayer {
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePlayer {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlayer {
    pub player_id: PlayerId,
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePlayerAction {
    pub player_id: PlayerId,
    pub action: PlayerAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlayerHeldItem {
    pub player_id: PlayerId,
    pub item_id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPlayerIntoPortal {
    pub player_id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStaticUnit {
    pub unit_id: UnitId,
    pub item_id: ItemId,
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFenceUnit {
    pub unit_id: UnitId,
    pub item_id: ItemId,
    pub position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePortalUnit {
    pub unit_id: UnitId,
    pub item_id: ItemId,
    pub position: Position,
    pub direction: Direction,
    pub target_position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLinkUnit {
    pub unit_id: UnitId,
    pub item_id: ItemId,
    pub position: Position,
    pub direction: Direction,
    pub url: String,
}

impl CreateStaticUnit {
    pub fn new(item_id: impl Into<ItemId>, position: Position, direction: Direction) -> Self {
        Self {
            unit_id: UnitId::generate(),
            item_id: item_id.into(),
            position,
            direction,
        }
    }

    pub fn to_unit(&self) -> Unit {
        Unit::new(
            self.unit_id.clone(),
            self.item_id.clone(),
            self.position,
            self.direction,
            UnitKind::Static,
        )
    }
}

impl CreateFenceUnit {
    pub fn new(item_id: impl Into<ItemId>, position: Position, direction: Direction) -> Self {
        Self {
            unit_id: UnitId::generate(),
            item_id: item_id.into(),
            position,
            direction,
        }
    }

    pub fn to_unit(&self) -> Unit {
        Unit::new(
            self.unit_id.clone(),
            self.item_id.clone(),
            self.position,
            self.direction,
            UnitKind::Fence,
        )
    }
}

impl CreatePortalUnit {
    pub fn new(
        item_id: impl Into<ItemId>,
        position: Position,
        direction: Direction,
        target_position: Option<Position>,
    ) -> Self {
        Self {
            unit_id: UnitId::generate(),
            item_id: item_id.into(),
            position,
            direction,
            target_position,
        }
    }

    pub fn to_unit(&self) -> Unit {
        Unit::new(
            self.unit_id.clone(),
            self.item_id.clone(),
            self.position,
            self.direction,
            UnitKind::Portal {
                target_position: self.target_position,
            },
        )
    }
}

impl CreateLinkUnit {
    pub fn new(
        item_id: impl Into<ItemId>,
        position: Position,
        direction: Direction,
        url: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: UnitId::generate(),
            item_id: item_id.into(),
            position,
            direction,
            url: url.into(),
        }
    }

    pub fn to_unit(&self) -> Unit {
        Unit::new(
            self.unit_id.clone(),
            self.item_id.clone(),
            self.position,
            self.direction,
            UnitKind::Link {
                url: self.url.clone(),
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStaticUnit {
    pub target: UnitLocator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFenceUnit {
    pub target: UnitLocator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePortalUnit {
    pub target: UnitLocator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLinkUnit {
    pub target: UnitLocator,
}

impl RemoveStaticUnit {
    pub const UNIT_TYPE: UnitType = UnitType::Static;
}

impl RemoveFenceUnit {
    pub const UNIT_TYPE: UnitType = UnitType::Fence;
}

impl RemovePortalUnit {
    pub const UNIT_TYPE: UnitType = UnitType::Portal;
}

impl RemoveLinkUnit {
    pub const UNIT_TYPE: UnitType = UnitType::Link;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateUnit {
    pub target: UnitLocator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item: Item,
}
