//! Services module - Pure decision logic of the discard engine.
//!
//! Nothing in here keeps state between calls. Every function takes the catalog,
//! the frozen internal lists and the current [`RuleConfiguration`](crate::models::RuleConfiguration)
//! explicitly, so the same inputs always give the same answer.
//!
//! # Components
//!
//! - [`lists`]: the hard-coded blacklist and whitelist, frozen through [`InternalListsBuilder`]
//! - [`classifier`]: [`can_discard`] and the [`Eligibility`] rule that decided
//! - [`scanner`]: [`InventoryScanner`] turning a live inventory into a [`CandidateQueue`](crate::models::CandidateQueue)
//! - [`dialog`]: [`DialogMatcher`] and the bounded confirmation dialog search
//! - [`surface`]: traits implemented by the game client, plus [`RecordedInventory`]
//! - [`simulated`]: [`SimulatedGame`], an in-memory client for dry runs
//!
//! # Usage Example
//!
//! ```ignore
//! use autodiscard::services::{InternalLists, InventoryScanner};
//!
//! let scanner = InventoryScanner::new(catalog, Arc::new(InternalLists::builtin()));
//! let queue = scanner.scan(&game, &game, &rules, None);
//! for target in queue.iter() {
//!     println!("{target}");
//! }
//! ```

pub mod classifier;
pub mod dialog;
pub mod lists;
pub mod scanner;
pub mod simulated;
pub mod surface;

pub use classifier::{Eligibility, can_discard, classify};
pub use dialog::{
    DISCARD_DIALOG_NAME, DialogMatcher, DialogTemplateError, MAX_DIALOG_INSTANCES, find_dialog,
};
pub use lists::{InternalLists, InternalListsBuilder};
pub use scanner::{InventoryScanner, PreviewItem, group_by_category};
pub use simulated::{DiscardResponse, SimulatedGame};
pub use surface::{
    CharacterSource, DialogHandle, DialogInstance, DialogSurface, DiscardInvoker, GameClient,
    GearsetSource, InventorySource, RecordedInventory,
};
