use crate::models::{
    CandidateQueue, ContainerId, DEFAULT_CONTAINERS, DiscardTarget, InventorySlot,
    InventorySnapshot, ItemCatalog, ItemFilter, LEFT_SIDE_GEAR_CONTAINERS,
    MAIN_HAND_OFF_HAND_CONTAINERS, RIGHT_SIDE_GEAR_CONTAINERS, RuleConfiguration,
};
use crate::services::classifier::can_discard;
use crate::services::lists::InternalLists;
use crate::services::surface::{GearsetSource, InventorySource};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// How gear found in a container is checked against saved gearsets.
enum GearsetGuard<'a> {
    /// Bag pages: gear is not checked against gearsets
    Unrestricted,
    /// Armoury with unreadable gearsets: all gear is skipped
    Unavailable,
    /// Armoury: gear used by any gearset is skipped
    Known(&'a HashSet<u32>),
}

impl GearsetGuard<'_> {
    fn allows(&self, item_id: u32) -> bool {
        match self {
            GearsetGuard::Unrestricted => true,
            GearsetGuard::Unavailable => false,
            GearsetGuard::Known(used) => !used.contains(&item_id),
        }
    }
}

/// One line of the "would be discarded" preview, grouped by item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewItem {
    pub item_id: u32,
    pub name: String,
    pub quantity: u64,
    pub ui_category: u32,
    pub ui_category_name: String,
}

impl std::fmt::Display for PreviewItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.quantity > 1 {
            write!(f, "{} ({}x)", self.name, self.quantity)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Turns a live inventory read into an ordered [`CandidateQueue`].
///
/// # Algorithm
///
/// Bag pages are visited first, then (when the armoury is enabled) the main/off-hand,
/// left side and right side sections whose toggle is on. Every occupied slot adds its
/// quantity to a per-item running total before any rule is applied, so stacks spread
/// over several containers count together against the ignore threshold.
///
/// A slot is a candidate when:
/// - the item passes the classifier and is on the discard list
/// - armoury gear is absent from every saved gearset (and gearsets could be read)
/// - gear that cannot be rebought is below the configured item level
/// - it carries no crafter signature, if signed items are ignored
/// - its item's total stays below the ignore threshold
/// - it is part of the optional item filter
#[derive(Debug, Clone)]
pub struct InventoryScanner {
    catalog: Arc<ItemCatalog>,
    lists: Arc<InternalLists>,
}

impl InventoryScanner {
    pub fn new(catalog: Arc<ItemCatalog>, lists: Arc<InternalLists>) -> Self {
        Self { catalog, lists }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn lists(&self) -> &InternalLists {
        &self.lists
    }

    /// Containers visited for the given rules, in scan order.
    pub fn containers_to_scan(rules: &RuleConfiguration) -> Vec<ContainerId> {
        let mut containers = DEFAULT_CONTAINERS.to_vec();
        let armoury = &rules.armoury;
        if armoury.discard_from_armoury_chest {
            if armoury.check_main_hand_off_hand {
                containers.extend(MAIN_HAND_OFF_HAND_CONTAINERS);
            }
            if armoury.check_left_side_gear {
                containers.extend(LEFT_SIDE_GEAR_CONTAINERS);
            }
            if armoury.check_right_side_gear {
                containers.extend(RIGHT_SIDE_GEAR_CONTAINERS);
            }
        }
        containers
    }

    pub fn scan<I, G>(
        &self,
        inventory: &I,
        gearsets: &G,
        rules: &RuleConfiguration,
        filter: Option<&ItemFilter>,
    ) -> CandidateQueue
    where
        I: InventorySource + ?Sized,
        G: GearsetSource + ?Sized,
    {
        let containers = Self::containers_to_scan(rules);

        let mut snapshot = InventorySnapshot::default();
        for &container in &containers {
            snapshot.push(container, inventory.read_container(container));
        }

        // Gearsets are only read when an armoury section is part of this scan.
        let gearset_items = if containers.iter().any(|c| c.is_armoury()) {
            let items = gearsets.gearset_items();
            if items.is_none() {
                tracing::debug!("Gearset data unavailable, skipping all armoury gear");
            }
            items
        } else {
            None
        };

        let mut item_counts: HashMap<u32, u64> = HashMap::new();
        let mut candidates: Vec<DiscardTarget> = Vec::new();

        for slot in snapshot.occupied() {
            *item_counts.entry(slot.item_id).or_default() += u64::from(slot.quantity);

            let guard = match (slot.slot.container.is_armoury(), gearset_items.as_ref()) {
                (false, _) => GearsetGuard::Unrestricted,
                (true, None) => GearsetGuard::Unavailable,
                (true, Some(items)) => GearsetGuard::Known(items),
            };

            if self.is_candidate(slot, rules, &guard) {
                tracing::trace!(
                    "Found item {} to discard in {} slot {}",
                    slot.item_id,
                    slot.slot.container,
                    slot.slot.index
                );
                candidates.push(DiscardTarget::from(slot));
            }
        }

        let threshold = u64::from(rules.ignore_item_count_when_above);
        candidates
            .into_iter()
            .filter(|c| item_counts.get(&c.item_id).copied().unwrap_or(0) < threshold)
            .filter(|c| filter.is_none_or(|f| f.contains(c.item_id)))
            .collect()
    }

    /// Head of [`scan`](Self::scan).
    pub fn next_item_to_discard<I, G>(
        &self,
        inventory: &I,
        gearsets: &G,
        rules: &RuleConfiguration,
        filter: Option<&ItemFilter>,
    ) -> Option<DiscardTarget>
    where
        I: InventorySource + ?Sized,
        G: GearsetSource + ?Sized,
    {
        self.scan(inventory, gearsets, rules, filter).pop_front()
    }

    /// Candidates grouped by item with summed quantities, sorted by name.
    pub fn preview<I, G>(&self, inventory: &I, gearsets: &G, rules: &RuleConfiguration) -> Vec<PreviewItem>
    where
        I: InventorySource + ?Sized,
        G: GearsetSource + ?Sized,
    {
        let mut grouped: HashMap<u32, PreviewItem> = HashMap::new();
        for target in self.scan(inventory, gearsets, rules, None) {
            let Some(item) = self.catalog.get(target.item_id) else {
                continue;
            };
            grouped
                .entry(target.item_id)
                .or_insert_with(|| PreviewItem {
                    item_id: item.item_id,
                    name: item.name.clone(),
                    quantity: 0,
                    ui_category: item.ui_category,
                    ui_category_name: item.ui_category_name.clone(),
                })
                .quantity += u64::from(target.quantity);
        }

        let mut items: Vec<PreviewItem> = grouped.into_values().collect();
        items.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.item_id.cmp(&b.item_id))
        });
        items
    }

    fn is_candidate(
        &self,
        slot: &InventorySlot,
        rules: &RuleConfiguration,
        guard: &GearsetGuard<'_>,
    ) -> bool {
        let item_id = slot.item_id;
        let item = self.catalog.get(item_id);

        if !can_discard(item_id, item, &self.lists, rules, true) {
            return false;
        }
        // classifier already denied unknown items
        let Some(item) = item else {
            return false;
        };

        if item.is_gear() && !guard.allows(item_id) {
            return false;
        }

        if item.is_gear()
            && !item.can_be_bought_from_vendor
            && item.item_level >= rules.armoury.maximum_gear_item_level
        {
            return false;
        }

        if rules.ignore_item_with_signature && slot.is_signed() {
            return false;
        }

        rules.is_selected_for_discard(item_id)
    }
}

/// Group preview lines by UI category, categories in ascending id order.
pub fn group_by_category(items: &[PreviewItem]) -> BTreeMap<(u32, String), Vec<&PreviewItem>> {
    let mut groups: BTreeMap<(u32, String), Vec<&PreviewItem>> = BTreeMap::new();
    for item in items {
        groups
            .entry((item.ui_category, item.ui_category_name.clone()))
            .or_default()
            .push(item);
    }
    groups
}
