//! Item catalog as far as this world has seen it.
//!
//! Units may reference items the catalog has not delivered yet. Those ids are
//! tracked as placeholders until an `AddItem` command resolves them.

use log::debug;
use shared::{Item, ItemId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemManager {
    items: HashMap<ItemId, Item>,
    placeholder_item_ids: HashSet<ItemId>,
}

impl ItemManager {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
            placeholder_item_ids: HashSet::new(),
        }
    }

    /// Stores an item, replacing a previous copy and resolving its
    /// placeholder. Returns true if the id was a placeholder.
    pub fn insert(&mut self, item: Item) -> bool {
        let resolved = self.placeholder_item_ids.remove(&item.id);
        if resolved {
            debug!("Placeholder item {} resolved", item.id);
        }
        self.items.insert(item.id.clone(), item);
        resolved
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Records referenced ids that are neither loaded nor already pending,
    /// returning just the newly discovered ones.
    pub fn track_placeholders<'a, I>(&mut self, referenced: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let mut discovered = Vec::new();
        for id in referenced {
            if self.items.contains_key(id) || self.placeholder_item_ids.contains(id) {
                continue;
            }
            self.placeholder_item_ids.insert(id.clone());
            discovered.push(id.clone());
        }
        discovered
    }

    pub fn placeholder_item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.placeholder_item_ids.iter()
    }
}
