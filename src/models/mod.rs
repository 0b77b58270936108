//! Data models for the AutoDiscard engine.
//!
//! - [`ItemDefinition`] / [`ItemCatalog`]: immutable item attributes loaded from `Game Data.yaml`
//! - [`RuleConfiguration`] / [`UserConfig`]: user-editable rules persisted in `AutoDiscard Config.yaml`
//! - [`InventorySlot`], [`SlotRef`], [`CandidateQueue`]: value copies of live inventory reads
//! - [`AppState`]: shared rules plus a mirror of the discard workflow for observers
//!
//! # Architecture Note
//!
//! Inventory types are plain values. Nothing here holds a reference into the live
//! game; slots are always re-resolved by [`SlotRef`] before acting on them.

pub mod app_state;
pub mod config;
pub mod inventory;
pub mod item;

pub use app_state::{AppState, PostProcessSubject, RunReason, WorkflowPhase};
pub use config::{
    ArmouryConfiguration, CharacterInfo, RuleConfiguration, UserConfig, WorkflowSettings,
};
pub use inventory::{
    CandidateQueue, ContainerId, DEFAULT_CONTAINERS, DiscardTarget, InventorySlot,
    InventorySnapshot, ItemFilter, LEFT_SIDE_GEAR_CONTAINERS, MAIN_HAND_OFF_HAND_CONTAINERS,
    RIGHT_SIDE_GEAR_CONTAINERS, SlotRef,
};
pub use item::{CatalogError, GameData, GameStrings, ItemCatalog, ItemDefinition};
