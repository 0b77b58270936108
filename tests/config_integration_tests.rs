//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Default user configuration when the file is missing
//! - Saving and reloading rules and workflow timings
//! - Game data loading into an item catalog
//! - Integration with StateManager

use autodiscard::config::{GAME_DATA_FILE, USER_CONFIG_FILE};
use autodiscard::models::{CharacterInfo, UserConfig};
use autodiscard::{ConfigManager, StateManager};
use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

const GAME_DATA: &str = r#"
Strings:
  Discard Item: "Discard {item}?"
  Discard Collectable: "Discard {item}? Collectables cannot be recovered once discarded."
Items:
  - Id: 500
    Name: Copper Ore
    UI Category: 44
    UI Category Name: Ingredient
  - Id: 3000
    Name: Bronze Helm
    Item Level: 5
    Equip Slot Category: 3
    UI Category: 34
    UI Category Name: Head
    Vendor Buyable: true
"#;

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(
        manager.user_config_path().to_path_buf(),
        config_path.join(USER_CONFIG_FILE)
    );
    assert_eq!(
        manager.game_data_path().to_path_buf(),
        config_path.join(GAME_DATA_FILE)
    );
}

#[test]
fn test_create_config_manager_makes_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("AutoDiscard Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.exists());
}

#[test]
fn test_load_default_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let user_config = manager.load_user_config().unwrap();

    assert_eq!(user_config.version, 1);
    assert!(!user_config.rules.run_after_venture);
    assert!(!user_config.rules.run_before_logout);
    assert!(user_config.rules.discarding_items.is_empty());
    assert_eq!(user_config.rules.ignore_item_count_when_above, 50);
    assert_eq!(user_config.rules.armoury.maximum_gear_item_level, 45);
    assert!(!user_config.rules.armoury.discard_from_armoury_chest);
    assert_eq!(user_config.workflow.discard_timeout_ms, 15_000);
}

#[test]
fn test_save_and_reload_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.rules.run_after_venture = true;
    config.rules.discarding_items.extend([502, 500, 501]);
    config.rules.blacklisted_items.insert(4551);
    config.rules.excluded_characters.push(CharacterInfo {
        local_content_id: 42,
        cached_player_name: Some("Alpha Beta".to_string()),
        cached_world_name: Some("Zodiark".to_string()),
    });
    config.workflow.poll_interval_ms = 250;
    manager.save_user_config(&config).unwrap();

    assert!(manager.user_config_path().exists());

    let loaded = manager.load_user_config().unwrap();
    assert!(loaded.rules.run_after_venture);
    assert_eq!(
        loaded.rules.discarding_items.iter().copied().collect::<Vec<_>>(),
        vec![502, 500, 501]
    );
    assert!(loaded.rules.blacklisted_items.contains(&4551));
    assert!(loaded.rules.is_character_excluded(42));
    assert_eq!(loaded.workflow.poll_interval_ms, 250);
}

#[test]
fn test_partial_user_config_fills_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.user_config_path(),
        "Rules:\n  Run Before Logout: true\n  Discarding Items: [500]\n",
    )
    .unwrap();

    let loaded = manager.load_user_config().unwrap();
    assert!(loaded.rules.run_before_logout);
    assert!(loaded.rules.is_selected_for_discard(500));
    assert_eq!(loaded.rules.ignore_item_count_when_above, 50);
    assert_eq!(loaded.workflow.dialog_delay_ms, 5);
}

#[test]
fn test_invalid_user_config_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.user_config_path(), "Rules: [not, a, map]").unwrap();

    assert!(manager.load_user_config().is_err());
}

#[test]
fn test_missing_game_data_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let err = manager.load_catalog().unwrap_err();
    assert!(err.to_string().contains("Game data file not found"));
}

#[test]
fn test_load_catalog_from_game_data() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.game_data_path(), GAME_DATA).unwrap();

    let (catalog, game_data) = manager.load_catalog().unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.item_name(500), "Copper Ore");
    let helm = catalog.get(3000).unwrap();
    assert!(helm.is_gear());
    assert!(helm.can_be_bought_from_vendor);
    assert_eq!(helm.item_level, 5);
    assert_eq!(game_data.strings.discard_item, "Discard {item}?");
    assert!(game_data.items.is_empty());
}

#[test]
fn test_duplicate_items_in_game_data_are_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(
        manager.game_data_path(),
        "Items:\n  - Id: 500\n    Name: A\n  - Id: 500\n    Name: B\n",
    )
    .unwrap();

    assert!(manager.load_catalog().is_err());
}

#[test]
fn test_config_round_trip_through_state_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    let state = StateManager::new();

    let mut config = manager.load_user_config().unwrap();
    state.load_from_user_config(&config);
    state.add_discard_item(500);
    state.update_settings(|settings| settings.confirm_delay_ms = 300);

    state.apply_to_user_config(&mut config);
    manager.save_user_config(&config).unwrap();

    let reloaded = manager.load_user_config().unwrap();
    assert!(reloaded.rules.is_selected_for_discard(500));
    assert_eq!(reloaded.workflow.confirm_delay_ms, 300);
}
