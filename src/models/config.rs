use crate::models::PostProcessSubject;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User configuration from `AutoDiscard Config.yaml`
///
/// Holds the discard rules and the workflow timings. Saved as a whole on every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "Version", default = "default_version")]
    pub version: u32,

    #[serde(rename = "Rules", default)]
    pub rules: RuleConfiguration,

    #[serde(rename = "Workflow", default)]
    pub workflow: WorkflowSettings,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            rules: RuleConfiguration::default(),
            workflow: WorkflowSettings::default(),
            debug_mode: false,
        }
    }
}

/// User-editable rules consulted by the classifier and the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    #[serde(rename = "Run After Venture", default)]
    pub run_after_venture: bool,

    #[serde(rename = "Run Before Logout", default)]
    pub run_before_logout: bool,

    /// Items explicitly selected for automatic discarding.
    #[serde(rename = "Discarding Items", default)]
    pub discarding_items: IndexSet<u32>,

    /// Items the user never wants discarded, on top of the internal blacklist.
    #[serde(rename = "Blacklisted Items", default)]
    pub blacklisted_items: IndexSet<u32>,

    /// Unique or untradable items the user still allows to be discarded.
    #[serde(rename = "Whitelisted Items", default)]
    pub whitelisted_items: IndexSet<u32>,

    #[serde(rename = "Excluded Characters", default)]
    pub excluded_characters: Vec<CharacterInfo>,

    #[serde(rename = "Armoury", default)]
    pub armoury: ArmouryConfiguration,

    /// Items whose combined quantity reaches this value are left alone.
    #[serde(
        rename = "Ignore Item Count When Above",
        default = "default_ignore_item_count"
    )]
    pub ignore_item_count_when_above: u32,

    #[serde(rename = "Ignore Item With Signature", default)]
    pub ignore_item_with_signature: bool,
}

impl Default for RuleConfiguration {
    fn default() -> Self {
        Self {
            run_after_venture: false,
            run_before_logout: false,
            discarding_items: IndexSet::new(),
            blacklisted_items: IndexSet::new(),
            whitelisted_items: IndexSet::new(),
            excluded_characters: Vec::new(),
            armoury: ArmouryConfiguration::default(),
            ignore_item_count_when_above: default_ignore_item_count(),
            ignore_item_with_signature: false,
        }
    }
}

impl RuleConfiguration {
    /// Whether automatic runs are wanted for the given host hook
    pub fn post_process_enabled(&self, subject: PostProcessSubject) -> bool {
        match subject {
            PostProcessSubject::RetainerVenture => self.run_after_venture,
            PostProcessSubject::CharacterLogout => self.run_before_logout,
        }
    }

    pub fn is_character_excluded(&self, local_content_id: u64) -> bool {
        self.excluded_characters
            .iter()
            .any(|c| c.local_content_id == local_content_id)
    }

    pub fn is_selected_for_discard(&self, item_id: u32) -> bool {
        self.discarding_items.contains(&item_id)
    }
}

/// Which armoury chest sections may be scanned, and up to which item level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmouryConfiguration {
    #[serde(rename = "Discard From Armoury Chest", default)]
    pub discard_from_armoury_chest: bool,

    #[serde(rename = "Check Main Hand Off Hand", default)]
    pub check_main_hand_off_hand: bool,

    #[serde(rename = "Check Left Side Gear", default)]
    pub check_left_side_gear: bool,

    #[serde(rename = "Check Right Side Gear", default)]
    pub check_right_side_gear: bool,

    #[serde(rename = "Maximum Gear Item Level", default = "default_max_gear_item_level")]
    pub maximum_gear_item_level: u32,
}

impl Default for ArmouryConfiguration {
    fn default() -> Self {
        Self {
            discard_from_armoury_chest: false,
            check_main_hand_off_hand: false,
            check_left_side_gear: false,
            check_right_side_gear: false,
            maximum_gear_item_level: default_max_gear_item_level(),
        }
    }
}

/// A character that never runs automatic discards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterInfo {
    #[serde(rename = "Local Content Id")]
    pub local_content_id: u64,

    #[serde(rename = "Player Name", default)]
    pub cached_player_name: Option<String>,

    #[serde(rename = "World Name", default)]
    pub cached_world_name: Option<String>,
}

impl CharacterInfo {
    pub fn new(local_content_id: u64) -> Self {
        Self {
            local_content_id,
            cached_player_name: None,
            cached_world_name: None,
        }
    }
}

/// Delays and deadlines of the discard workflow, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Delay between issuing a discard and the first dialog check
    #[serde(rename = "Dialog Delay", default = "default_dialog_delay")]
    pub dialog_delay_ms: u64,

    /// Delay between confirming the dialog and the first removal check
    #[serde(rename = "Confirm Delay", default = "default_confirm_delay")]
    pub confirm_delay_ms: u64,

    #[serde(rename = "Poll Interval", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Measured from the moment the discard was issued
    #[serde(rename = "Discard Timeout", default = "default_discard_timeout")]
    pub discard_timeout_ms: u64,

    #[serde(rename = "Max Dialog Instances", default = "default_max_dialog_instances")]
    pub max_dialog_instances: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            dialog_delay_ms: default_dialog_delay(),
            confirm_delay_ms: default_confirm_delay(),
            poll_interval_ms: default_poll_interval(),
            discard_timeout_ms: default_discard_timeout(),
            max_dialog_instances: default_max_dialog_instances(),
        }
    }
}

impl WorkflowSettings {
    pub fn dialog_delay(&self) -> Duration {
        Duration::from_millis(self.dialog_delay_ms)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn discard_timeout(&self) -> Duration {
        Duration::from_millis(self.discard_timeout_ms)
    }
}

fn default_version() -> u32 {
    1
}

fn default_ignore_item_count() -> u32 {
    50
}

fn default_max_gear_item_level() -> u32 {
    45
}

fn default_dialog_delay() -> u64 {
    5
}

fn default_confirm_delay() -> u64 {
    100
}

fn default_poll_interval() -> u64 {
    100
}

fn default_discard_timeout() -> u64 {
    15_000
}

fn default_max_dialog_instances() -> usize {
    crate::services::dialog::MAX_DIALOG_INSTANCES
}
