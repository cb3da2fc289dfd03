//! Units placed on the world grid and the closed dispatch over their kinds.

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, UnitId};
use crate::position::{Direction, Position};

/// Payload-free tag of a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Static,
    Fence,
    Portal,
    Link,
}

/// Kind of a unit together with whatever only that kind carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    Static,
    Fence,
    #[serde(rename_all = "camelCase")]
    Portal {
        target_position: Option<Position>,
    },
    Link {
        url: String,
    },
}

impl UnitKind {
    pub fn unit_type(&self) -> UnitType {
        match self {
            UnitKind::Static => UnitType::Static,
            UnitKind::Fence => UnitType::Fence,
            UnitKind::Portal { .. } => UnitType::Portal,
            UnitKind::Link { .. } => UnitType::Link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub item_id: ItemId,
    pub position: Position,
    pub direction: Direction,
    pub kind: UnitKind,
}

impl Unit {
    pub fn new(
        id: impl Into<UnitId>,
        item_id: impl Into<ItemId>,
        position: Position,
        direction: Direction,
        kind: UnitKind,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            position,
            direction,
            kind,
        }
    }

    pub fn unit_type(&self) -> UnitType {
        self.kind.unit_type()
    }

    /// Routes the unit to the visitor method of its kind.
    pub fn visit<V: UnitVisitor>(&self, visitor: &mut V) -> V::Output {
        match &self.kind {
            UnitKind::Static => visitor.visit_static(self),
            UnitKind::Fence => visitor.visit_fence(self),
            UnitKind::Portal { target_position } => {
                visitor.visit_portal(self, target_position.as_ref())
            }
            UnitKind::Link { url } => visitor.visit_link(self, url),
        }
    }

    /// Destination of a linked portal, `None` for every other unit.
    pub fn portal_target(&self) -> Option<Position> {
        match self.kind {
            UnitKind::Portal { target_position } => target_position,
            _ => None,
        }
    }
}

/// Kind-specific handling of a unit. Payloads are only handed out once the
/// kind is established.
pub trait UnitVisitor {
    type Output;

    fn visit_static(&mut self, unit: &Unit) -> Self::Output;
    fn visit_fence(&mut self, unit: &Unit) -> Self::Output;
    fn visit_portal(&mut self, unit: &Unit, target_position: Option<&Position>) -> Self::Output;
    fn visit_link(&mut self, unit: &Unit, url: &str) -> Self::Output;
}

/// Handler per unit type for [`dispatch_unit_type`]. Every field is
/// required, so a missing kind is a compile error.
pub struct UnitTypeHandlers<S, F, P, L> {
    pub static_: S,
    pub fence: F,
    pub portal: P,
    pub link: L,
}

pub fn dispatch_unit_type<R, S, F, P, L>(
    unit_type: UnitType,
    handlers: UnitTypeHandlers<S, F, P, L>,
) -> R
where
    S: FnOnce() -> R,
    F: FnOnce() -> R,
    P: FnOnce() -> R,
    L: FnOnce() -> R,
{
    match unit_type {
        UnitType::Static => (handlers.static_)(),
        UnitType::Fence => (handlers.fence)(),
        UnitType::Portal => (handlers.portal)(),
        UnitType::Link => (handlers.link)(),
    }
}

/// How a command addresses a unit: by identity or by the cell it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitLocator {
    Id(UnitId),
    Position(Position),
}

impl From<UnitId> for UnitLocator {
    fn from(id: UnitId) -> Self {
        UnitLocator::Id(id)
    }
}

impl From<Position> for UnitLocator {
    fn from(position: Position) -> Self {
        UnitLocator::Position(position)
    }
}
