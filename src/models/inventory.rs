use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Identifies an inventory container (a bag page or an armoury chest section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerId {
    Inventory1,
    Inventory2,
    Inventory3,
    Inventory4,
    ArmouryMainHand,
    ArmouryOffHand,
    ArmouryHead,
    ArmouryBody,
    ArmouryHands,
    ArmouryLegs,
    ArmouryFeet,
    ArmouryEars,
    ArmouryNeck,
    ArmouryWrists,
    ArmouryRings,
}

/// Bag pages, always scanned first.
pub const DEFAULT_CONTAINERS: [ContainerId; 4] = [
    ContainerId::Inventory1,
    ContainerId::Inventory2,
    ContainerId::Inventory3,
    ContainerId::Inventory4,
];

pub const MAIN_HAND_OFF_HAND_CONTAINERS: [ContainerId; 2] =
    [ContainerId::ArmouryMainHand, ContainerId::ArmouryOffHand];

pub const LEFT_SIDE_GEAR_CONTAINERS: [ContainerId; 5] = [
    ContainerId::ArmouryHead,
    ContainerId::ArmouryBody,
    ContainerId::ArmouryHands,
    ContainerId::ArmouryLegs,
    ContainerId::ArmouryFeet,
];

pub const RIGHT_SIDE_GEAR_CONTAINERS: [ContainerId; 4] = [
    ContainerId::ArmouryEars,
    ContainerId::ArmouryNeck,
    ContainerId::ArmouryWrists,
    ContainerId::ArmouryRings,
];

impl ContainerId {
    pub fn is_armoury(self) -> bool {
        !DEFAULT_CONTAINERS.contains(&self)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stable reference to one slot: the only identity that survives a single inventory read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotRef {
    #[serde(rename = "Container")]
    pub container: ContainerId,

    #[serde(rename = "Slot")]
    pub index: u16,
}

impl SlotRef {
    pub fn new(container: ContainerId, index: u16) -> Self {
        Self { container, index }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.container, self.index)
    }
}

/// Value copy of an occupied slot. An `item_id` of 0 marks an empty slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    #[serde(flatten)]
    pub slot: SlotRef,

    #[serde(rename = "Item")]
    pub item_id: u32,

    #[serde(rename = "Quantity", default = "default_quantity")]
    pub quantity: u32,

    #[serde(rename = "Crafter", default, skip_serializing_if = "Option::is_none")]
    pub crafter_signature: Option<u64>,
}

fn default_quantity() -> u32 {
    1
}

impl InventorySlot {
    pub fn new(slot: SlotRef, item_id: u32, quantity: u32) -> Self {
        Self {
            slot,
            item_id,
            quantity,
            crafter_signature: None,
        }
    }

    pub fn signed_by(mut self, crafter: u64) -> Self {
        self.crafter_signature = Some(crafter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.item_id == 0
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.crafter_signature, Some(crafter) if crafter != 0)
    }
}

/// One read of a set of containers, in the order they were requested.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    containers: Vec<(ContainerId, Vec<InventorySlot>)>,
}

impl InventorySnapshot {
    pub fn push(&mut self, container: ContainerId, mut slots: Vec<InventorySlot>) {
        slots.sort_by_key(|slot| slot.slot.index);
        self.containers.push((container, slots));
    }

    /// Occupied slots, container by container, slot index ascending.
    pub fn occupied(&self) -> impl Iterator<Item = &InventorySlot> {
        self.containers
            .iter()
            .flat_map(|(_, slots)| slots.iter())
            .filter(|slot| !slot.is_empty())
    }

    pub fn containers(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.containers.iter().map(|(container, _)| *container)
    }
}

/// A slot chosen for discarding, captured at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiscardTarget {
    pub slot: SlotRef,
    pub item_id: u32,
    pub quantity: u32,
}

impl From<&InventorySlot> for DiscardTarget {
    fn from(slot: &InventorySlot) -> Self {
        Self {
            slot: slot.slot,
            item_id: slot.item_id,
            quantity: slot.quantity,
        }
    }
}

impl fmt::Display for DiscardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item {} x{} at {}", self.item_id, self.quantity, self.slot)
    }
}

/// Ordered result of one scan pass. Consumed from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateQueue {
    targets: VecDeque<DiscardTarget>,
}

impl CandidateQueue {
    pub fn pop_front(&mut self) -> Option<DiscardTarget> {
        self.targets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscardTarget> {
        self.targets.iter()
    }

    pub fn item_ids(&self) -> Vec<u32> {
        self.targets.iter().map(|target| target.item_id).collect()
    }
}

impl FromIterator<DiscardTarget> for CandidateQueue {
    fn from_iter<T: IntoIterator<Item = DiscardTarget>>(iter: T) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CandidateQueue {
    type Item = DiscardTarget;
    type IntoIter = std::collections::vec_deque::IntoIter<DiscardTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

/// Restricts a run to a user-selected subset of item ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    item_ids: HashSet<u32>,
}

impl ItemFilter {
    pub fn new(item_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            item_ids: item_ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, item_id: u32) -> bool {
        self.item_ids.contains(&item_id)
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}
