use crate::models::{GameData, ItemCatalog, UserConfig};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the user configuration inside the data directory.
pub const USER_CONFIG_FILE: &str = "AutoDiscard Config.yaml";

/// File name of the exported game data inside the data directory.
pub const GAME_DATA_FILE: &str = "Game Data.yaml";

/// Configuration manager for loading and saving YAML files of the data directory.
///
/// Manages two files:
/// - User config (`AutoDiscard Config.yaml`): discard rules and workflow timings, read and written
/// - Game data (`Game Data.yaml`): item catalog and localized dialog text, read only
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
    game_data_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager over `config_dir` (e.g. "AutoDiscard Data"),
    /// creating the directory when it does not exist yet.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            game_data_path: config_dir.join(GAME_DATA_FILE),
            config_dir,
        })
    }

    /// Load the user configuration file.
    ///
    /// # Returns
    /// The loaded UserConfig, or default if file doesn't exist
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
            return Ok(UserConfig::default());
        }

        let file_contents = fs::read_to_string(&self.user_config_path)
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Load the game data file. Unlike the user config there is no fallback:
    /// without items nothing can be classified.
    pub fn load_game_data(&self) -> Result<GameData> {
        if !self.game_data_path.exists() {
            bail!("Game data file not found: {}", self.game_data_path);
        }

        let file_contents = fs::read_to_string(&self.game_data_path)
            .with_context(|| format!("Failed to read game data: {}", self.game_data_path))?;

        let data: GameData = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse game data: {}", self.game_data_path))?;

        tracing::info!(
            "Loaded {} item definitions from {}",
            data.items.len(),
            self.game_data_path
        );
        Ok(data)
    }

    /// Load the game data file and build the item catalog from it.
    pub fn load_catalog(&self) -> Result<(ItemCatalog, GameData)> {
        let mut data = self.load_game_data()?;
        let items = std::mem::take(&mut data.items);
        let catalog = ItemCatalog::new(items)
            .with_context(|| format!("Invalid game data: {}", self.game_data_path))?;
        Ok((catalog, data))
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    pub fn game_data_path(&self) -> &Utf8Path {
        &self.game_data_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_user_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = manager.load_user_config().unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.rules.ignore_item_count_when_above, 50);
    }

    #[test]
    fn test_load_save_user_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = UserConfig::default();
        config.rules.discarding_items.extend([502, 500, 501]);
        manager.save_user_config(&config).unwrap();

        let loaded = manager.load_user_config().unwrap();
        let order: Vec<u32> = loaded.rules.discarding_items.iter().copied().collect();
        assert_eq!(order, vec![502, 500, 501]);
    }

    #[test]
    fn test_missing_game_data_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert!(manager.load_game_data().is_err());
    }

    #[test]
    fn test_invalid_game_data_is_an_error() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.game_data_path(), "Items: [").unwrap();
        assert!(manager.load_game_data().is_err());

        fs::write(manager.game_data_path(), "Items: []").unwrap();
        assert!(manager.load_catalog().is_err());
    }
}
