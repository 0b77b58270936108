use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// UI category id of gil, tomestones and other currencies.
pub const UI_CATEGORY_CURRENCY: u32 = 100;

/// UI category id of shards, crystals and clusters.
pub const UI_CATEGORY_CRYSTAL: u32 = 59;

/// UI category id used for items that can no longer be obtained.
pub const UI_CATEGORY_UNOBTAINABLE: u32 = 39;

/// Immutable attributes of a single item, as exported from the game data sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    #[serde(rename = "Id")]
    pub item_id: u32,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Item Level", default)]
    pub item_level: u32,

    #[serde(rename = "Rarity", default)]
    pub rarity: u8,

    #[serde(rename = "Unique", default)]
    pub is_unique: bool,

    #[serde(rename = "Untradable", default)]
    pub is_untradable: bool,

    #[serde(rename = "Indisposable", default)]
    pub is_indisposable: bool,

    #[serde(rename = "UI Category", default)]
    pub ui_category: u32,

    #[serde(rename = "UI Category Name", default)]
    pub ui_category_name: String,

    /// Equip slot category; 0 means the item is not gear.
    #[serde(rename = "Equip Slot Category", default)]
    pub equip_slot_category: u32,

    /// Gear that can be bought back from a vendor regardless of the other flags.
    #[serde(rename = "Vendor Buyable", default)]
    pub can_be_bought_from_vendor: bool,
}

impl ItemDefinition {
    pub fn is_gear(&self) -> bool {
        self.equip_slot_category > 0
    }

    /// Currencies, crystals and unobtainable items are never offered for discard.
    pub fn is_protected_category(&self) -> bool {
        matches!(
            self.ui_category,
            UI_CATEGORY_CURRENCY | UI_CATEGORY_CRYSTAL | UI_CATEGORY_UNOBTAINABLE
        )
    }
}

/// Errors raised while building the item catalog
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Item id 0 is reserved for empty slots ({0})")]
    ReservedItemId(String),

    #[error("Item {0} is defined more than once")]
    DuplicateItem(u32),

    #[error("Game data contains no items")]
    Empty,
}

/// Static lookup from item id to [`ItemDefinition`].
///
/// Built once at startup and never mutated afterwards; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<u32, ItemDefinition>,
}

impl ItemCatalog {
    /// Build the catalog, rejecting empty input, duplicate ids and the reserved id 0.
    pub fn new(items: Vec<ItemDefinition>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut map = HashMap::with_capacity(items.len());
        for item in items {
            if item.item_id == 0 {
                return Err(CatalogError::ReservedItemId(item.name));
            }
            let item_id = item.item_id;
            if map.insert(item_id, item).is_some() {
                return Err(CatalogError::DuplicateItem(item_id));
            }
        }

        tracing::info!("Item catalog built with {} items", map.len());
        Ok(Self { items: map })
    }

    pub fn get(&self, item_id: u32) -> Option<&ItemDefinition> {
        self.items.get(&item_id)
    }

    /// Display name of an item, or an empty string for unknown ids.
    pub fn item_name(&self, item_id: u32) -> &str {
        self.items
            .get(&item_id)
            .map(|item| item.name.as_str())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }
}

/// Localized text templates of the discard confirmation prompts.
///
/// Placeholders are written as `{...}` and match any text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStrings {
    #[serde(rename = "Discard Item")]
    pub discard_item: String,

    #[serde(rename = "Discard Collectable")]
    pub discard_collectable: String,
}

impl Default for GameStrings {
    fn default() -> Self {
        Self {
            discard_item: "Discard {item}?".to_string(),
            discard_collectable: "Discard {item}? Collectables cannot be recovered once discarded."
                .to_string(),
        }
    }
}

/// Contents of `Game Data.yaml`: dialog templates plus every known item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    #[serde(rename = "Strings", default)]
    pub strings: GameStrings,

    #[serde(rename = "Items")]
    pub items: Vec<ItemDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_id: u32, name: &str) -> ItemDefinition {
        ItemDefinition {
            item_id,
            name: name.to_string(),
            item_level: 1,
            rarity: 1,
            is_unique: false,
            is_untradable: false,
            is_indisposable: false,
            ui_category: 44,
            ui_category_name: "Ingredient".to_string(),
            equip_slot_category: 0,
            can_be_bought_from_vendor: false,
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = ItemCatalog::new(vec![item(500, "Copper Ore"), item(501, "Tin Ore")]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.item_name(500), "Copper Ore");
        assert_eq!(catalog.item_name(9999), "");
        assert!(catalog.get(501).is_some());
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = ItemCatalog::new(vec![item(500, "A"), item(500, "B")]);
        assert_eq!(result.unwrap_err(), CatalogError::DuplicateItem(500));
    }

    #[test]
    fn test_catalog_rejects_empty_and_reserved() {
        assert_eq!(ItemCatalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);
        assert!(matches!(
            ItemCatalog::new(vec![item(0, "Nothing")]),
            Err(CatalogError::ReservedItemId(_))
        ));
    }

    #[test]
    fn test_protected_categories() {
        let mut crystal = item(2, "Fire Shard");
        crystal.ui_category = UI_CATEGORY_CRYSTAL;
        assert!(crystal.is_protected_category());

        let ore = item(500, "Copper Ore");
        assert!(!ore.is_protected_category());
        assert!(!ore.is_gear());
    }
}
