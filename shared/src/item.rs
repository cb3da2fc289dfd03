use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::unit::UnitType;

/// Catalog entry describing what a unit looks like and what it becomes
/// when a player places it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub compatible_unit_type: UnitType,
    pub model_src: String,
    pub thumbnail_src: String,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, compatible_unit_type: UnitType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            compatible_unit_type,
            model_src: String::new(),
            thumbnail_src: String::new(),
        }
    }
}
