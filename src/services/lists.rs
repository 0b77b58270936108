//! Hard-coded item lists that override item attributes.
//!
//! The lists are assembled once through [`InternalListsBuilder`] and frozen into an
//! immutable [`InternalLists`], which callers share behind an `Arc` and pass
//! explicitly to the classifier and scanner.

use crate::models::RuleConfiguration;
use std::collections::HashSet;

/// Never offered for discard, whatever the user configured.
///
/// Some of these cannot be discarded at all; others have irreversible side effects.
const INTERNAL_BLACKLIST: &[u32] = &[
    2820,  // red onion helm
    16039, // ala mhigan earrings
    24589, // aetheryte earrings
    33648, // menphina's earrings
    41081, // azeyma's earrings
    10155, // ceruleum tank
    10373, // magitek repair materials
    21197, // UCOB token
    23175, // UWU token
    28633, // TEA token
    36810, // DSR token
    38951, // TOP token
];

/// Ids 1..=99 are currencies, shards, crystals and clusters.
const RESERVED_LOW_IDS: std::ops::RangeInclusive<u32> = 1..=99;

/// Unique or untradable items that are nonetheless safe to discard.
#[rustfmt::skip]
const INTERNAL_WHITELIST: &[u32] = &[
    // onion and antique gear
    2962, 3279, 3743, 9387, 9388, 9389, 9390, 9391, 6223, 6224,
    // vendor restockable consumables and manuals
    7060, 14945, 15772, 15773, 15774, 4572, 20790,
    // beast tribe fate drops
    7001, 7002, 7003, 7797, 7798, 7802, 7803, 7804, 7805,
    // fate drops exchanged for rewards
    12252, 12253, 18032, 20521, 20638, 27972, 27973, 36633, 36634,
    // normal raid materials without weekly lockout
    12674, 12675, 12676, 12677, 12678, 12680, 13581, 13583, 13585, 13587,
    14301, 14302, 14303, 14304, 14305, 14307,
    16545, 16546, 16547, 16548, 16549, 16550, 16552,
    19111, 19112, 19113, 19114, 19115, 19117, 19122,
    21774, 21775, 21776, 21777, 21778, 21780,
    23963, 23964, 23965, 23966, 23967, 23969,
    27393, 27394, 27395, 27396, 27397, 27399,
    29020, 29021, 29022, 29023, 29024, 29026,
    32133, 32134, 32135, 32136, 32137, 32139,
    35817, 35818, 35819, 35820, 35821, 35822,
    38375, 38376, 38377, 38378, 38379, 38380, 38385,
    40297, 40298, 40299, 40300, 40301, 40302, 40317,
    // cracked crystals and clusters
    15110, 16783, 18030, 18031, 26819, 26820, 26821, 26822, 36025, 36026, 36027, 36028,
    // eureka lootboxes
    21831, 21832, 22306,
    // unapproved firmament materials
    32005, 32006, 32007, 32008, 32009, 32010, 32011, 32012, 32013, 32014, 32015, 32016,
    32017, 32018, 32019, 32020, 32021, 32022, 32023, 32024, 32025, 32026, 32027, 32028,
    32029, 32030, 32031, 32032, 32033, 32034, 32035, 32036, 32037, 32038, 32039, 32040,
    32041, 32042, 32043, 32044, 32045, 32046, 32047, 32048,
    // irregular tomestones of past events
    24909, 26536, 28648, 30272, 31339, 33329, 33330, 35834, 36658, 38211, 39365, 39919,
    41305, 41306,
];

/// Frozen internal blacklist and whitelist.
#[derive(Debug, Clone)]
pub struct InternalLists {
    blacklist: HashSet<u32>,
    whitelist: HashSet<u32>,
}

impl InternalLists {
    /// The built-in lists, with no additions.
    pub fn builtin() -> Self {
        InternalListsBuilder::with_builtin().freeze()
    }

    /// Internal blacklist first, then the user blacklist when `rules` is given.
    pub fn is_blacklisted(&self, item_id: u32, rules: Option<&RuleConfiguration>) -> bool {
        if self.blacklist.contains(&item_id) {
            return true;
        }

        rules.is_some_and(|rules| rules.blacklisted_items.contains(&item_id))
    }

    pub fn is_internally_blacklisted(&self, item_id: u32) -> bool {
        self.blacklist.contains(&item_id)
    }

    /// Internal whitelist, or the user whitelist when `rules` is given.
    pub fn is_whitelisted(&self, item_id: u32, rules: Option<&RuleConfiguration>) -> bool {
        if self.whitelist.contains(&item_id) {
            return true;
        }

        rules.is_some_and(|rules| rules.whitelisted_items.contains(&item_id))
    }

    /// Sorted copy of the internal blacklist, for display.
    pub fn internal_blacklist(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.blacklist.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Collects list entries before they are frozen.
#[derive(Debug, Default)]
pub struct InternalListsBuilder {
    blacklist: HashSet<u32>,
    whitelist: HashSet<u32>,
}

impl InternalListsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        Self::new()
            .blacklist(INTERNAL_BLACKLIST.iter().copied())
            .blacklist(RESERVED_LOW_IDS)
            .whitelist(INTERNAL_WHITELIST.iter().copied())
    }

    pub fn blacklist(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.blacklist.extend(ids);
        self
    }

    pub fn whitelist(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.whitelist.extend(ids);
        self
    }

    pub fn freeze(self) -> InternalLists {
        tracing::debug!(
            "Internal lists frozen: {} blacklisted, {} whitelisted",
            self.blacklist.len(),
            self.whitelist.len()
        );
        InternalLists {
            blacklist: self.blacklist,
            whitelist: self.whitelist,
        }
    }
}
