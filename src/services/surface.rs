//! Collaborator interfaces of the live game client.
//!
//! The engine never reaches into game memory. Every read returns value copies
//! keyed by [`SlotRef`], and every action is a fire-and-forget call whose effect
//! is only observable through later reads.

use crate::models::{ContainerId, InventorySlot, SlotRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only access to the live inventory. Two calls may observe different state.
pub trait InventorySource {
    /// Occupied slots of one container. Order is not significant.
    fn read_container(&self, container: ContainerId) -> Vec<InventorySlot>;

    /// Current contents of one slot, `None` when it is empty.
    fn read_slot(&self, slot: SlotRef) -> Option<InventorySlot>;
}

/// Items referenced by saved gearsets.
pub trait GearsetSource {
    /// `None` when gearset data is unavailable; callers must then fail closed.
    fn gearset_items(&self) -> Option<HashSet<u32>>;
}

/// Opaque handle to one addressable dialog instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogHandle(pub u64);

/// State of a dialog instance at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogInstance {
    pub handle: DialogHandle,
    pub is_visible: bool,
    /// Fully loaded and accepting input
    pub is_ready: bool,
    pub text: String,
}

/// Modal dialogs of the game UI.
pub trait DialogSurface {
    /// Instance `index` (1-based) of the dialog called `name`, if it exists.
    fn dialog(&self, name: &str, index: usize) -> Option<DialogInstance>;

    /// Press the confirm button of the dialog.
    fn confirm(&mut self, handle: DialogHandle);
}

/// Issues the in-game discard command.
pub trait DiscardInvoker {
    /// Fire-and-forget; failure is only observable through the slot contents.
    fn discard(&mut self, slot: SlotRef);
}

/// Identity of the logged-in character.
pub trait CharacterSource {
    /// Local content id, `None` when logged out.
    fn current_character(&self) -> Option<u64>;
}

/// Everything the discard engine needs from the game client.
pub trait GameClient:
    InventorySource + GearsetSource + DialogSurface + DiscardInvoker + CharacterSource
{
}

impl<T> GameClient for T where
    T: InventorySource + GearsetSource + DialogSurface + DiscardInvoker + CharacterSource
{
}

/// An inventory captured to a file, usable wherever a live inventory is expected.
///
/// Loaded by the preview binary and used as the backing store of test doubles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedInventory {
    #[serde(rename = "Slots", default)]
    slots: Vec<InventorySlot>,

    /// Absent means gearset data could not be read.
    #[serde(rename = "Gearset Items", default)]
    gearset_items: Option<Vec<u32>>,

    #[serde(rename = "Character", default)]
    character: Option<u64>,
}

impl RecordedInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an item into a slot, replacing whatever was there.
    pub fn set_slot(&mut self, slot: InventorySlot) {
        self.clear_slot(slot.slot);
        if !slot.is_empty() {
            self.slots.push(slot);
        }
    }

    pub fn with_slot(mut self, slot: InventorySlot) -> Self {
        self.set_slot(slot);
        self
    }

    pub fn clear_slot(&mut self, slot: SlotRef) {
        self.slots.retain(|existing| existing.slot != slot);
    }

    pub fn set_gearset_items(&mut self, items: Option<Vec<u32>>) {
        self.gearset_items = items;
    }

    pub fn set_character(&mut self, character: Option<u64>) {
        self.character = character;
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl InventorySource for RecordedInventory {
    fn read_container(&self, container: ContainerId) -> Vec<InventorySlot> {
        self.slots
            .iter()
            .filter(|slot| slot.slot.container == container)
            .cloned()
            .collect()
    }

    fn read_slot(&self, slot: SlotRef) -> Option<InventorySlot> {
        self.slots.iter().find(|existing| existing.slot == slot).cloned()
    }
}

impl GearsetSource for RecordedInventory {
    fn gearset_items(&self) -> Option<HashSet<u32>> {
        self.gearset_items
            .as_ref()
            .map(|items| items.iter().copied().collect())
    }
}

impl CharacterSource for RecordedInventory {
    fn current_character(&self) -> Option<u64> {
        self.character
    }
}
