//! Keyed store of the units on the grid, indexed by position.
//!
//! At most one unit occupies a cell. Inserting onto an occupied cell is
//! refused with [`WorldError::OccupiedPosition`]. Re-inserting a unit that
//! is already placed on its cell, and removal of a missing unit, are silent
//! no-ops so echoed broadcasts replay cleanly.

use log::{debug, info};
use shared::{Position, Unit, UnitId, UnitLocator, UnitType, WorldError};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitManager {
    units: HashMap<UnitId, Unit>,
    positions: HashMap<Position, UnitId>,
}

impl UnitManager {
    /// Builds the store from a snapshot. Units landing on an already taken
    /// cell are dropped and reported.
    pub fn new(units: Vec<Unit>) -> (Self, Vec<WorldError>) {
        let mut manager = Self::default();
        let rejected = units
            .into_iter()
            .filter_map(|unit| manager.insert(unit).err())
            .collect();
        (manager, rejected)
    }

    /// Places a unit. Returns `Ok(false)` when the same unit already sits
    /// on that cell, which happens when our own create is echoed back.
    pub fn insert(&mut self, unit: Unit) -> Result<bool, WorldError> {
        if let Some(existing) = self.units.get(&unit.id) {
            if existing.position == unit.position {
                debug!("Unit {} already placed, skipping", unit.id);
                return Ok(false);
            }
            return Err(WorldError::duplicate("Unit", &unit.id));
        }
        if let Some(occupant) = self.positions.get(&unit.position) {
            return Err(WorldError::OccupiedPosition {
                position: unit.position,
                occupant: occupant.clone(),
            });
        }

        debug!(
            "Unit {} ({:?}) placed at ({}, {})",
            unit.id,
            unit.unit_type(),
            unit.position.x,
            unit.position.z
        );
        self.positions.insert(unit.position, unit.id.clone());
        self.units.insert(unit.id.clone(), unit);
        Ok(true)
    }

    /// Removes whatever unit the locator points at.
    pub fn remove(&mut self, locator: &UnitLocator) -> Option<Unit> {
        let id = self.resolve(locator)?.clone();
        let unit = self.units.remove(&id)?;
        self.positions.remove(&unit.position);
        info!("Removed unit {} at ({}, {})", unit.id, unit.position.x, unit.position.z);
        Some(unit)
    }

    /// Removes the located unit only if it is of `unit_type`.
    pub fn remove_of_type(&mut self, locator: &UnitLocator, unit_type: UnitType) -> Option<Unit> {
        let found = self.find(locator)?.unit_type();
        if found != unit_type {
            debug!("Expected a {:?} unit at {:?} but found {:?}, skipping", unit_type, locator, found);
            return None;
        }
        self.remove(locator)
    }

    /// Turns the located unit one step clockwise, returning its snapshots
    /// before and after.
    pub fn rotate(&mut self, locator: &UnitLocator) -> Option<(Unit, Unit)> {
        let id = self.resolve(locator)?.clone();
        let unit = self.units.get_mut(&id)?;
        let old = unit.clone();
        unit.direction = unit.direction.rotate();
        Some((old, unit.clone()))
    }

    pub fn get(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// The unit occupying `position`, if any.
    pub fn get_at(&self, position: &Position) -> Option<&Unit> {
        self.positions.get(position).and_then(|id| self.units.get(id))
    }

    pub fn find(&self, locator: &UnitLocator) -> Option<&Unit> {
        match locator {
            UnitLocator::Id(id) => self.get(id),
            UnitLocator::Position(position) => self.get_at(position),
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn resolve(&self, locator: &UnitLocator) -> Option<&UnitId> {
        self.find(locator).map(|unit| &unit.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Direction, UnitKind};
    use tokio_test::{assert_err, assert_ok};

    fn unit(id: &str, item: &str, x: i32, z: i32, kind: UnitKind) -> Unit {
        Unit::new(id, item, Position::new(x, z), Direction::Up, kind)
    }

    #[test]
    fn test_insert_and_lookup_by_position() {
        let mut manager = UnitManager::default();
        assert_ok!(manager.insert(unit("u1", "stone", 2, 2, UnitKind::Static)));

        let found = manager.get_at(&Position::new(2, 2)).unwrap();
        assert_eq!(found.id, UnitId::from("u1"));
        assert!(manager.get_at(&Position::new(0, 0)).is_none());
    }

    #[test]
    fn test_occupied_position_is_rejected() {
        let mut manager = UnitManager::default();
        assert_ok!(manager.insert(unit("u1", "stone", 2, 2, UnitKind::Static)));

        let err = assert_err!(manager.insert(unit("u2", "torch", 2, 2, UnitKind::Static)));
        assert_eq!(
            err,
            WorldError::OccupiedPosition {
                position: Position::new(2, 2),
                occupant: UnitId::from("u1"),
            }
        );
        assert_eq!(manager.get_at(&Position::new(2, 2)).unwrap().item_id.as_str(), "stone");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_duplicate_unit_id_is_rejected() {
        let mut manager = UnitManager::default();
        assert_ok!(manager.insert(unit("u1", "stone", 0, 0, UnitKind::Static)));
        assert_err!(manager.insert(unit("u1", "stone", 1, 1, UnitKind::Static)));
        assert!(manager.get_at(&Position::new(1, 1)).is_none());
    }

    #[test]
    fn test_reinserting_placed_unit_is_noop() {
        let mut manager = UnitManager::default();
        assert_eq!(manager.insert(unit("u1", "stone", 0, 0, UnitKind::Static)), Ok(true));
        manager.rotate(&UnitLocator::Id(UnitId::from("u1")));

        assert_eq!(manager.insert(unit("u1", "stone", 0, 0, UnitKind::Static)), Ok(false));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get(&UnitId::from("u1")).unwrap().direction, Direction::Right);
    }

    #[test]
    fn test_snapshot_with_overlapping_units() {
        let (manager, rejected) = UnitManager::new(vec![
            unit("u1", "stone", 0, 0, UnitKind::Static),
            unit("u2", "torch", 0, 0, UnitKind::Fence),
        ]);
        assert_eq!(manager.len(), 1);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_remove_by_id_or_position() {
        let (mut manager, _) = UnitManager::new(vec![
            unit("u1", "stone", 0, 0, UnitKind::Static),
            unit("u2", "fence", 1, 0, UnitKind::Fence),
        ]);

        assert!(manager.remove(&UnitLocator::Id(UnitId::from("u1"))).is_some());
        assert!(manager.remove(&UnitLocator::Position(Position::new(1, 0))).is_some());
        assert!(manager.is_empty());
        assert!(manager.get_at(&Position::new(0, 0)).is_none());
        assert!(manager.get_at(&Position::new(1, 0)).is_none());
        assert_eq!(manager, UnitManager::default());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let (mut manager, _) = UnitManager::new(vec![unit("u1", "stone", 0, 0, UnitKind::Static)]);
        let before = manager.clone();

        assert!(manager.remove(&UnitLocator::Position(Position::new(5, 5))).is_none());
        assert_eq!(manager, before);
    }

    #[test]
    fn test_cell_is_free_again_after_removal() {
        let mut manager = UnitManager::default();
        assert_ok!(manager.insert(unit("u1", "stone", 0, 0, UnitKind::Static)));
        manager.remove(&UnitLocator::Id(UnitId::from("u1")));
        assert_ok!(manager.insert(unit("u2", "torch", 0, 0, UnitKind::Static)));
    }

    #[test]
    fn test_remove_of_type_checks_kind() {
        let (mut manager, _) = UnitManager::new(vec![unit("u1", "fence", 0, 0, UnitKind::Fence)]);
        let at = UnitLocator::Position(Position::new(0, 0));

        assert!(manager.remove_of_type(&at, UnitType::Static).is_none());
        assert_eq!(manager.len(), 1);
        assert!(manager.remove_of_type(&at, UnitType::Fence).is_some());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_rotate_keeps_identity() {
        let (mut manager, _) = UnitManager::new(vec![unit("u1", "stone", 0, 0, UnitKind::Static)]);

        let (old, new) = manager.rotate(&UnitLocator::Id(UnitId::from("u1"))).unwrap();
        assert_eq!(old.direction, Direction::Up);
        assert_eq!(new.direction, Direction::Right);
        assert_eq!(old.id, new.id);
        assert!(manager.rotate(&UnitLocator::Position(Position::new(9, 9))).is_none());
    }
}
