use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, WorldId};
use crate::item::Item;
use crate::player::Player;
use crate::unit::Unit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,
    pub name: String,
}

/// Everything a participant receives when entering a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub world: World,
    pub my_player_id: PlayerId,
    pub players: Vec<Player>,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl WorldSnapshot {
    /// A world with nobody and nothing in it yet.
    pub fn empty(world_id: impl Into<WorldId>, my_player_id: impl Into<PlayerId>) -> Self {
        Self {
            world: World {
                id: world_id.into(),
                name: String::new(),
            },
            my_player_id: my_player_id.into(),
            players: Vec::new(),
            units: Vec::new(),
            items: Vec::new(),
        }
    }
}
