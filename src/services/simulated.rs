//! An in-memory game client for dry runs.
//!
//! Discarding a slot opens a confirmation prompt rendered from the localized
//! template; confirming it removes the item. Used by `autodiscard simulate` and by
//! the workflow tests.

use crate::models::{ContainerId, GameStrings, InventorySlot, ItemCatalog, SlotRef};
use crate::services::dialog::DISCARD_DIALOG_NAME;
use crate::services::surface::{
    CharacterSource, DialogHandle, DialogInstance, DialogSurface, DiscardInvoker, GearsetSource,
    InventorySource, RecordedInventory,
};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct OpenDialog {
    handle: DialogHandle,
    slot: SlotRef,
    text: String,
}

/// How the simulated client reacts to a discard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscardResponse {
    /// Open a confirmation prompt
    #[default]
    Prompt,
    /// Remove the item without asking
    Immediate,
    /// Do nothing at all
    Ignore,
}

#[derive(Debug, Clone)]
pub struct SimulatedGame {
    inventory: RecordedInventory,
    catalog: Arc<ItemCatalog>,
    prompt_template: String,
    response: DiscardResponse,
    dialog: Option<OpenDialog>,
    next_handle: u64,
    discard_requests: Vec<SlotRef>,
    confirmations: usize,
}

impl SimulatedGame {
    pub fn new(inventory: RecordedInventory, catalog: Arc<ItemCatalog>, strings: &GameStrings) -> Self {
        Self {
            inventory,
            catalog,
            prompt_template: strings.discard_item.clone(),
            response: DiscardResponse::default(),
            dialog: None,
            next_handle: 1,
            discard_requests: Vec::new(),
            confirmations: 0,
        }
    }

    pub fn with_response(mut self, response: DiscardResponse) -> Self {
        self.response = response;
        self
    }

    pub fn set_response(&mut self, response: DiscardResponse) {
        self.response = response;
    }

    pub fn inventory(&self) -> &RecordedInventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut RecordedInventory {
        &mut self.inventory
    }

    /// Every slot a discard was requested for, in order.
    pub fn discard_requests(&self) -> &[SlotRef] {
        &self.discard_requests
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    fn render_prompt(&self, item_id: u32) -> String {
        let name = self.catalog.item_name(item_id);
        let mut text = String::with_capacity(self.prompt_template.len() + name.len());
        let mut rest = self.prompt_template.as_str();
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            text.push_str(&rest[..open]);
            text.push_str(name);
            rest = &rest[open + close + 1..];
        }
        text.push_str(rest);
        text
    }
}

impl InventorySource for SimulatedGame {
    fn read_container(&self, container: ContainerId) -> Vec<InventorySlot> {
        self.inventory.read_container(container)
    }

    fn read_slot(&self, slot: SlotRef) -> Option<InventorySlot> {
        self.inventory.read_slot(slot)
    }
}

impl GearsetSource for SimulatedGame {
    fn gearset_items(&self) -> Option<HashSet<u32>> {
        self.inventory.gearset_items()
    }
}

impl CharacterSource for SimulatedGame {
    fn current_character(&self) -> Option<u64> {
        self.inventory.current_character()
    }
}

impl DialogSurface for SimulatedGame {
    fn dialog(&self, name: &str, index: usize) -> Option<DialogInstance> {
        if name != DISCARD_DIALOG_NAME || index != 1 {
            return None;
        }
        self.dialog.as_ref().map(|dialog| DialogInstance {
            handle: dialog.handle,
            is_visible: true,
            is_ready: true,
            text: dialog.text.clone(),
        })
    }

    fn confirm(&mut self, handle: DialogHandle) {
        let Some(dialog) = self.dialog.take_if(|dialog| dialog.handle == handle) else {
            tracing::warn!("Confirm for unknown dialog {:?}", handle);
            return;
        };
        self.confirmations += 1;
        self.inventory.clear_slot(dialog.slot);
    }
}

impl DiscardInvoker for SimulatedGame {
    fn discard(&mut self, slot: SlotRef) {
        self.discard_requests.push(slot);

        let Some(item) = self.inventory.read_slot(slot) else {
            return;
        };
        match self.response {
            DiscardResponse::Prompt => {
                let handle = DialogHandle(self.next_handle);
                self.next_handle += 1;
                self.dialog = Some(OpenDialog {
                    handle,
                    slot,
                    text: self.render_prompt(item.item_id),
                });
            }
            DiscardResponse::Immediate => self.inventory.clear_slot(slot),
            DiscardResponse::Ignore => {}
        }
    }
}
