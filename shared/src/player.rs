use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, PlayerId};
use crate::position::{Direction, Position, PrecisePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerActionKind {
    Stand,
    Walk,
}

/// What a player is doing, anchored where and when it started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAction {
    pub kind: PlayerActionKind,
    pub precise_position: PrecisePosition,
    pub direction: Direction,
    /// Milliseconds since the Unix epoch.
    pub time: u64,
}

impl PlayerAction {
    pub fn stand(precise_position: PrecisePosition, direction: Direction, time: u64) -> Self {
        Self {
            kind: PlayerActionKind::Stand,
            precise_position,
            direction,
            time,
        }
    }

    pub fn walk(precise_position: PrecisePosition, direction: Direction, time: u64) -> Self {
        Self {
            kind: PlayerActionKind::Walk,
            precise_position,
            direction,
            time,
        }
    }

    pub fn is_walking(&self) -> bool {
        self.kind == PlayerActionKind::Walk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub precise_position: PrecisePosition,
    pub direction: Direction,
    pub action: PlayerAction,
    pub held_item_id: Option<ItemId>,
}

impl Player {
    /// A standing player placed on `position`.
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        position: Position,
        direction: Direction,
        time: u64,
    ) -> Self {
        let precise_position = position.to_precise();
        Self {
            id: id.into(),
            name: name.into(),
            position,
            precise_position,
            direction,
            action: PlayerAction::stand(precise_position, direction, time),
            held_item_id: None,
        }
    }

    /// The cell `distance` steps ahead of where the player is facing.
    pub fn forward_position(&self, distance: i32) -> Position {
        self.position.neighbor(self.direction, distance)
    }

    /// Where the player is drawn at `now` given its current action.
    ///
    /// Standing players stay on their action origin. Walking players advance
    /// from the origin along the action direction at `walk_speed` cells per
    /// second.
    pub fn precise_position_at(&self, now: u64, walk_speed: f32) -> PrecisePosition {
        if !self.action.is_walking() {
            return self.action.precise_position;
        }

        let elapsed_secs = now.saturating_sub(self.action.time) as f32 / 1000.0;
        self.action
            .precise_position
            .advance(self.action.direction, elapsed_secs * walk_speed)
    }

    /// Applies an action: direction and position snap to the action origin.
    pub fn apply_action(&mut self, action: PlayerAction) {
        self.action = action;
        self.direction = action.direction;
        self.precise_position = action.precise_position;
        self.position = action.precise_position.to_position();
    }

    /// Places the player on `position` without changing the facing.
    pub fn teleport(&mut self, position: Position, time: u64) {
        self.position = position;
        self.precise_position = position.to_precise();
        self.action = PlayerAction::stand(self.precise_position, self.direction, time);
    }
}
