// AutoDiscard - Rule-driven automatic inventory discarding
//
// This is the library crate containing the discard engine and its data structures.
// The binary crate (main.rs) provides a headless preview and dry-run entry point.

pub mod automation;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod workflow;

// Re-export commonly used types for convenience
pub use automation::{AutomationCoordinator, AutomationHost, HostEvent, Notifier};
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppState, GameData, ItemCatalog, RuleConfiguration, UserConfig};
pub use services::{InternalLists, InventoryScanner};
pub use state::{StateChange, StateManager};
pub use workflow::{DiscardWorkflow, RunReport, WorkflowError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Default data directory holding the configuration and game data files
pub const DATA_DIR: &str = "AutoDiscard Data";
