//! Change notifications published after a command has been applied.

use log::debug;
use shared::{Item, ItemId, Player, Unit};

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    PlayerAdded(Player),
    PlayerChanged { old: Player, new: Player },
    /// Same payload as `PlayerChanged`, only for the local player.
    MyPlayerChanged { old: Player, new: Player },
    PlayerRemoved(Player),
    UnitCreated(Unit),
    UnitUpdated { old: Unit, new: Unit },
    UnitDeleted(Unit),
    ItemAdded(Item),
    /// Item ids referenced by units that the catalog has not delivered yet.
    PlaceholderItemIdsAdded(Vec<ItemId>),
    PerspectiveDepthChanged(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    PlayerAdded,
    PlayerChanged,
    MyPlayerChanged,
    PlayerRemoved,
    UnitCreated,
    UnitUpdated,
    UnitDeleted,
    ItemAdded,
    PlaceholderItemIdsAdded,
    PerspectiveDepthChanged,
}

impl WorldEvent {
    pub fn kind(&self) -> WorldEventKind {
        match self {
            WorldEvent::PlayerAdded(_) => WorldEventKind::PlayerAdded,
            WorldEvent::PlayerChanged { .. } => WorldEventKind::PlayerChanged,
            WorldEvent::MyPlayerChanged { .. } => WorldEventKind::MyPlayerChanged,
            WorldEvent::PlayerRemoved(_) => WorldEventKind::PlayerRemoved,
            WorldEvent::UnitCreated(_) => WorldEventKind::UnitCreated,
            WorldEvent::UnitUpdated { .. } => WorldEventKind::UnitUpdated,
            WorldEvent::UnitDeleted(_) => WorldEventKind::UnitDeleted,
            WorldEvent::ItemAdded(_) => WorldEventKind::ItemAdded,
            WorldEvent::PlaceholderItemIdsAdded(_) => WorldEventKind::PlaceholderItemIdsAdded,
            WorldEvent::PerspectiveDepthChanged(_) => WorldEventKind::PerspectiveDepthChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn FnMut(&WorldEvent)>;

/// Subscriber registry keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, WorldEventKind, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: WorldEventKind, subscriber: Subscriber) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, kind, subscriber));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &WorldEvent) {
        let kind = event.kind();
        for (_, _, subscriber) in self
            .subscribers
            .iter_mut()
            .filter(|(_, sub_kind, _)| *sub_kind == kind)
        {
            subscriber(event);
        }
    }

    pub fn clear(&mut self) {
        if !self.subscribers.is_empty() {
            debug!("Dropping {} subscribers", self.subscribers.len());
        }
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
