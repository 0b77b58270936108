//! AutoDiscard - Rule-driven automatic inventory discarding
//!
//! Headless entry point for checking a configuration without a live game.
//!
//! # Overview
//!
//! Both commands load, from the data directory (`AutoDiscard Data/` by default):
//! - `AutoDiscard Config.yaml`: discard rules and workflow timings (defaults when missing)
//! - `Game Data.yaml`: item catalog and localized dialog text (required)
//!
//! plus a recorded inventory file (see [`RecordedInventory`]).
//!
//! - `preview` prints the items the current rules would discard, grouped by UI category.
//! - `simulate` drives a complete manual run against an in-memory client and prints
//!   every step, using the real workflow timings.

use anyhow::{Context, Result};
use autodiscard::automation::{AutomationCoordinator, AutomationHost, Notifier};
use autodiscard::logging::{self, LogOptions};
use autodiscard::models::{ItemFilter, PostProcessSubject};
use autodiscard::services::{
    DialogMatcher, DiscardResponse, InternalLists, InventoryScanner, RecordedInventory,
    SimulatedGame, group_by_category,
};
use autodiscard::{APP_NAME, ConfigManager, DATA_DIR, DiscardWorkflow, Metrics, StateChange};
use autodiscard::{StateManager, VERSION};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "autodiscard", version, about = "Preview and dry-run automatic discards")]
struct Args {
    /// Directory holding the configuration and game data files
    #[arg(long, default_value = DATA_DIR)]
    data_dir: Utf8PathBuf,

    /// Log at debug level, also to stderr
    #[arg(long)]
    debug: bool,

    /// Write the log file as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List what the current rules would discard
    Preview {
        /// Recorded inventory (YAML)
        #[arg(long)]
        inventory: Utf8PathBuf,
    },

    /// Run the discard workflow against a recorded inventory
    Simulate {
        /// Recorded inventory (YAML)
        #[arg(long)]
        inventory: Utf8PathBuf,

        /// Only discard these item ids
        #[arg(long, value_delimiter = ',')]
        only: Vec<u32>,

        /// Never show a confirmation dialog, to see the timeout path
        #[arg(long)]
        unresponsive: bool,
    },
}

/// Stand-in for the automation host; the simulation only runs manual discards.
struct NoHost;

impl AutomationHost for NoHost {
    fn register_hooks(&mut self, subject: PostProcessSubject) {
        tracing::debug!("Would register {} hooks", subject);
    }

    fn unregister_hooks(&mut self, subject: PostProcessSubject) {
        tracing::debug!("Would unregister {} hooks", subject);
    }

    fn request_post_process(&mut self, subject: PostProcessSubject) {
        tracing::debug!("Would request {} post-process", subject);
    }

    fn finish_post_process(&mut self, subject: PostProcessSubject) {
        tracing::debug!("Would finish {} post-process", subject);
    }
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn print(&mut self, message: &str) {
        println!("{message}");
    }

    fn print_error(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = logging::init(
        &LogOptions::new("logs", "autodiscard")
            .debug(args.debug)
            .console(args.debug)
            .json(args.json_logs),
    )?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(&args.data_dir)?;
    let user_config = config_manager.load_user_config()?;
    let (catalog, game_data) = config_manager.load_catalog()?;
    let catalog = Arc::new(catalog);

    let state_manager = StateManager::new();
    state_manager.load_from_user_config(&user_config);

    let scanner = InventoryScanner::new(Arc::clone(&catalog), Arc::new(InternalLists::builtin()));

    match args.command {
        Command::Preview { inventory } => {
            let inventory = load_inventory(&inventory)?;
            preview(&scanner, &state_manager, &inventory);
            Ok(())
        }
        Command::Simulate {
            inventory,
            only,
            unresponsive,
        } => {
            let inventory = load_inventory(&inventory)?;
            let response = if unresponsive {
                DiscardResponse::Ignore
            } else {
                DiscardResponse::Prompt
            };
            let game = SimulatedGame::new(inventory, catalog, &game_data.strings)
                .with_response(response);
            let matcher = DialogMatcher::new(&game_data.strings)
                .context("Invalid dialog text in game data")?;
            let filter = (!only.is_empty()).then(|| ItemFilter::new(only));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(simulate(scanner, matcher, state_manager, game, filter))
        }
    }
}

fn load_inventory(path: &Utf8PathBuf) -> Result<RecordedInventory> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read inventory: {}", path))?;
    let inventory: RecordedInventory = serde_yaml_ng::from_str(&contents)
        .with_context(|| format!("Failed to parse inventory: {}", path))?;
    tracing::info!("Loaded {} occupied slots from {}", inventory.slot_count(), path);
    Ok(inventory)
}

fn preview(scanner: &InventoryScanner, state_manager: &StateManager, inventory: &RecordedInventory) {
    let rules = state_manager.rules();
    let items = scanner.preview(inventory, inventory, &rules);

    if items.is_empty() {
        println!("Nothing would be discarded.");
        return;
    }

    for ((_, category), entries) in group_by_category(&items) {
        println!("{category}");
        for entry in entries {
            println!("  {entry}");
        }
    }
}

async fn simulate(
    scanner: InventoryScanner,
    matcher: DialogMatcher,
    state_manager: StateManager,
    mut game: SimulatedGame,
    filter: Option<ItemFilter>,
) -> Result<()> {
    let metrics = Arc::new(Metrics::new());
    let settings = state_manager.settings();
    let names = scanner.clone();

    let mut events = state_manager.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(change) = events.recv().await {
            match change {
                StateChange::PhaseChanged {
                    phase,
                    target: Some(target),
                } => println!(
                    "[{phase}] {} at {}",
                    names.catalog().item_name(target.item_id),
                    target.slot
                ),
                StateChange::DiscardFinished { .. } | StateChange::DiscardAborted { .. } => break,
                _ => {}
            }
        }
    });

    let workflow = DiscardWorkflow::new(scanner, matcher, Arc::clone(&metrics));
    let mut coordinator =
        AutomationCoordinator::new(NoHost, ConsoleNotifier, workflow, state_manager);

    coordinator.start_manual(filter, Instant::now());

    // interval() panics on a zero period
    let period = settings
        .poll_interval()
        .min(settings.confirm_delay())
        .max(Duration::from_millis(1));
    let mut interval = tokio::time::interval(period);
    while coordinator.is_running() {
        let now = interval.tick().await.into_std();
        coordinator.tick(&mut game, now);
    }
    drop(coordinator);

    printer.await.context("Event printer task failed")?;
    metrics.log_summary();
    Ok(())
}
