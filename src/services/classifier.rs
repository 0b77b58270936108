use crate::models::{ItemDefinition, RuleConfiguration};
use crate::services::lists::InternalLists;

/// Outcome of [`classify`], naming the rule that decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    InternalBlacklist,
    UserBlacklist,
    UnknownItem,
    ProtectedCategory,
    Whitelisted,
    Discardable,
    Restricted,
}

impl Eligibility {
    pub fn is_allowed(self) -> bool {
        matches!(self, Eligibility::Whitelisted | Eligibility::Discardable)
    }
}

/// Decide whether an item may ever be discarded. First matching rule wins:
///
/// 1. internal blacklist denies
/// 2. user blacklist denies, only when `check_user_blacklist` is set
/// 3. items missing from the catalog are denied
/// 4. currency, crystal and unobtainable categories are denied
/// 5. internal or user whitelist allows
/// 6. otherwise allowed when vendor-rebuyable, or neither unique, untradable nor indisposable
pub fn classify(
    item_id: u32,
    item: Option<&ItemDefinition>,
    lists: &InternalLists,
    rules: &RuleConfiguration,
    check_user_blacklist: bool,
) -> Eligibility {
    if lists.is_internally_blacklisted(item_id) {
        return Eligibility::InternalBlacklist;
    }

    if check_user_blacklist && rules.blacklisted_items.contains(&item_id) {
        return Eligibility::UserBlacklist;
    }

    let Some(item) = item else {
        return Eligibility::UnknownItem;
    };

    if item.is_protected_category() {
        return Eligibility::ProtectedCategory;
    }

    if lists.is_whitelisted(item_id, Some(rules)) {
        return Eligibility::Whitelisted;
    }

    if item.can_be_bought_from_vendor
        || (!item.is_unique && !item.is_untradable && !item.is_indisposable)
    {
        Eligibility::Discardable
    } else {
        Eligibility::Restricted
    }
}

/// Boolean form of [`classify`].
pub fn can_discard(
    item_id: u32,
    item: Option<&ItemDefinition>,
    lists: &InternalLists,
    rules: &RuleConfiguration,
    check_user_blacklist: bool,
) -> bool {
    classify(item_id, item, lists, rules, check_user_blacklist).is_allowed()
}
