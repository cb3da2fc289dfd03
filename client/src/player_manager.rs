//! Keyed store of the players in a world.
//!
//! The manager is the only place player state is mutated; commands reach it
//! through [`crate::commands::PlayerCommand`].

use log::{debug, info};
use shared::{Player, PlayerId, WorldError};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerManager {
    players: HashMap<PlayerId, Player>,
}

impl PlayerManager {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            players: players
                .into_iter()
                .map(|player| (player.id.clone(), player))
                .collect(),
        }
    }

    /// Adds a player. An existing identity is never overwritten.
    pub fn insert(&mut self, player: Player) -> Result<(), WorldError> {
        if self.players.contains_key(&player.id) {
            return Err(WorldError::duplicate("Player", &player.id));
        }

        info!("Added player {} at ({}, {})", player.id, player.position.x, player.position.z);
        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Removes a player, returning it. Absent ids are a no-op.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        let removed = self.players.remove(id);
        match &removed {
            Some(_) => info!("Removed player {}", id),
            None => debug!("Player {} already gone, nothing to remove", id),
        }
        removed
    }

    pub fn get(&self, id: &PlayerId) -> Result<&Player, WorldError> {
        self.players
            .get(id)
            .ok_or_else(|| WorldError::not_found("Player", id))
    }

    pub fn find(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Applies `mutator` to a player and returns its snapshots before and
    /// after, or `None` when the player does not exist.
    pub fn update<F>(&mut self, id: &PlayerId, mutator: F) -> Option<(Player, Player)>
    where
        F: FnOnce(&mut Player),
    {
        let Some(player) = self.players.get_mut(id) else {
            debug!("Player {} not found, update skipped", id);
            return None;
        };

        let old = player.clone();
        mutator(player);
        Some((old, player.clone()))
    }

    /// All players, in no particular order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
