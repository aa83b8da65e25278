//! Slot layouts for container variants.
//!
//! Variants differ in slot count, in which slot range persists to disk,
//! and in whether the owner may evict them when no view is attached.
//! They share no state; a layout is a pure capability handed to the
//! container at construction.

use std::ops::Range;

/// Number of slots in a single chest (3 rows x 9 columns).
pub const CHEST_SLOT_COUNT: usize = 27;

/// Number of slots in a double chest.
pub const DOUBLE_CHEST_SLOT_COUNT: usize = 54;

/// Number of slots in a furnace (input, fuel, output).
pub const FURNACE_SLOT_COUNT: usize = 3;

/// Per-variant slot capability.
pub trait SlotLayout: Send + Sync {
    /// Total number of slots in the container.
    fn slot_count(&self) -> usize;

    /// Index range written to and read from the backing file, in order.
    fn persisted_slots(&self) -> Range<usize> {
        0..self.slot_count()
    }

    /// True if the container must stay resident even with no attached
    /// views (scheduled variants such as an active furnace).
    fn retain_while_idle(&self) -> bool {
        false
    }
}

/// Single chest: 27 slots, fully persisted, evictable when unviewed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChestLayout;

impl SlotLayout for ChestLayout {
    fn slot_count(&self) -> usize {
        CHEST_SLOT_COUNT
    }
}

/// Double chest: 54 slots, fully persisted, evictable when unviewed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleChestLayout;

impl SlotLayout for DoubleChestLayout {
    fn slot_count(&self) -> usize {
        DOUBLE_CHEST_SLOT_COUNT
    }
}

/// Furnace: 3 slots, kept resident while idle so scheduled smelting
/// survives the last viewer closing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FurnaceLayout;

impl SlotLayout for FurnaceLayout {
    fn slot_count(&self) -> usize {
        FURNACE_SLOT_COUNT
    }

    fn retain_while_idle(&self) -> bool {
        true
    }
}
