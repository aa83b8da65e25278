//! Slot entries - the single unit stored in a container slot.

use serde::{Deserialize, Serialize};

/// Item identifier referencing the item registry.
pub type ItemId = u16;

/// Item id of the empty sentinel. Slots never hold "no value"; an
/// unoccupied slot holds an entry with this id.
pub const EMPTY_ITEM: ItemId = 0xFFFF;

/// One slot's payload: item identity, quantity, an auxiliary metadata
/// word (durability, enchantment), and the slot index it occupies.
///
/// The canonical array invariant is that `slot` always equals the
/// entry's array position; setters re-stamp it on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Item type identifier, or [`EMPTY_ITEM`] for the sentinel.
    pub item: ItemId,
    /// Number of items in this slot.
    pub count: u8,
    /// Auxiliary metadata word (damage value, enchantment bits).
    pub aux: u16,
    /// Index of the slot holding this entry.
    pub slot: u8,
}

impl Entry {
    /// Create a new occupied entry. The slot index is stamped by the
    /// container when the entry is stored.
    pub fn new(item: ItemId, count: u8) -> Self {
        Self {
            item,
            count,
            aux: 0,
            slot: 0,
        }
    }

    /// Create an occupied entry carrying auxiliary metadata.
    pub fn with_aux(item: ItemId, count: u8, aux: u16) -> Self {
        Self {
            item,
            count,
            aux,
            slot: 0,
        }
    }

    /// The empty sentinel for the given slot index.
    pub fn empty(slot: u8) -> Self {
        Self {
            item: EMPTY_ITEM,
            count: 0,
            aux: 0,
            slot,
        }
    }

    /// True if this entry is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.item == EMPTY_ITEM
    }

    /// Copy of this entry re-stamped with a slot index.
    pub fn at_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::empty(0)
    }
}
