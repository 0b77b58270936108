// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for observers of the discard engine.

use crate::models::{
    AppState, CharacterInfo, DiscardTarget, RuleConfiguration, RunReason, UserConfig,
    WorkflowPhase, WorkflowSettings,
};
use crate::workflow::{RunOutcome, RunReport, WorkflowState};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (a configuration window, a status
/// overlay, IPC subscribers) about state changes without requiring them to poll.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Discard rules have been updated
    ConfigurationChanged {
        discarding_items: usize,
    },

    /// Workflow timings have been updated
    SettingsChanged,

    /// A discard run has started
    DiscardStarted {
        reason: Option<RunReason>,
    },

    /// The run moved to another phase or target
    PhaseChanged {
        phase: WorkflowPhase,
        target: Option<DiscardTarget>,
    },

    /// The removal of an item was verified
    ItemDiscarded {
        discarded_this_run: usize,
        total_discarded: usize,
    },

    /// A discard run has ended, successfully or not
    DiscardFinished {
        phase: WorkflowPhase,
        discarded: usize,
        message: Option<String>,
    },

    /// A discard run was replaced or cancelled before it ended
    DiscardAborted {
        reason: Option<RunReason>,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// The rules read by the scanner on every tick live here, so configuration edits
/// from another thread are seen by the next scan.
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::config::ConfigManager`]: Loads configurations into state
/// - [`crate::automation::AutomationCoordinator`]: Mirrors the workflow into state
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Multiple subscribers can listen for state changes
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Clone of the entire state, safe to use without holding locks.
    pub fn snapshot(&self) -> AppState {
        self.read(Clone::clone)
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let running = state_manager.read(|state| state.is_running());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        // It's OK if no one is listening
        let _ = self.state_tx.send(change);
    }

    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.rules != new.rules {
            changes.push(StateChange::ConfigurationChanged {
                discarding_items: new.rules.discarding_items.len(),
            });
        }

        if old.workflow != new.workflow {
            changes.push(StateChange::SettingsChanged);
        }

        if old.is_discarding != new.is_discarding {
            if new.is_discarding {
                changes.push(StateChange::DiscardStarted {
                    reason: new.run_reason,
                });
            } else if new.phase.is_terminal() {
                changes.push(StateChange::DiscardFinished {
                    phase: new.phase,
                    discarded: new.discarded_this_run,
                    message: new.last_message.clone(),
                });
            }
        }

        if new.is_discarding
            && (old.phase != new.phase || old.current_target != new.current_target)
        {
            changes.push(StateChange::PhaseChanged {
                phase: new.phase,
                target: new.current_target,
            });
        }

        if new.discarded_this_run > old.discarded_this_run {
            changes.push(StateChange::ItemDiscarded {
                discarded_this_run: new.discarded_this_run,
                total_discarded: new.total_discarded,
            });
        }

        changes
    }

    // Configuration

    /// Copy rules and workflow timings from the loaded configuration file.
    pub fn load_from_user_config(&self, user_config: &UserConfig) -> Vec<StateChange> {
        self.update(|state| {
            state.rules = user_config.rules.clone();
            state.workflow = user_config.workflow.clone();

            tracing::info!(
                "Loaded user config: {} items to discard, {} blacklisted, {} excluded characters, armoury={}",
                state.rules.discarding_items.len(),
                state.rules.blacklisted_items.len(),
                state.rules.excluded_characters.len(),
                state.rules.armoury.discard_from_armoury_chest
            );
        })
    }

    /// Write rules and timings back into a configuration for saving.
    pub fn apply_to_user_config(&self, user_config: &mut UserConfig) {
        self.read(|state| {
            user_config.rules = state.rules.clone();
            user_config.workflow = state.workflow.clone();
        });
    }

    pub fn rules(&self) -> RuleConfiguration {
        self.read(|state| state.rules.clone())
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.read(|state| state.workflow.clone())
    }

    pub fn update_rules<F>(&self, rules_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut RuleConfiguration),
    {
        self.update(|state| rules_fn(&mut state.rules))
    }

    pub fn update_settings<F>(&self, settings_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut WorkflowSettings),
    {
        self.update(|state| settings_fn(&mut state.workflow))
    }

    pub fn add_discard_item(&self, item_id: u32) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules.discarding_items.insert(item_id);
        })
    }

    pub fn remove_discard_item(&self, item_id: u32) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules.discarding_items.shift_remove(&item_id);
        })
    }

    pub fn add_blacklisted_item(&self, item_id: u32) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules.blacklisted_items.insert(item_id);
        })
    }

    pub fn remove_blacklisted_item(&self, item_id: u32) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules.blacklisted_items.shift_remove(&item_id);
        })
    }

    /// Never run automatic discards for this character. Replaces an existing entry.
    pub fn exclude_character(&self, character: CharacterInfo) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules
                .excluded_characters
                .retain(|c| c.local_content_id != character.local_content_id);
            rules.excluded_characters.push(character);
        })
    }

    pub fn include_character(&self, local_content_id: u64) -> Vec<StateChange> {
        self.update_rules(|rules| {
            rules
                .excluded_characters
                .retain(|c| c.local_content_id != local_content_id);
        })
    }

    // Run mirroring

    pub fn start_run(&self, reason: RunReason) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_run_state();
            state.is_discarding = true;
            state.run_reason = Some(reason);
            state.phase = WorkflowPhase::IssuingDiscard;
        })
    }

    /// Mirror the workflow after a tick.
    pub fn sync_run(&self, workflow: &WorkflowState) -> Vec<StateChange> {
        self.update(|state| {
            let newly_discarded = workflow.discarded.saturating_sub(state.discarded_this_run);
            state.total_discarded += newly_discarded;
            state.discarded_this_run = workflow.discarded;
            state.phase = workflow.phase;
            state.current_target = workflow.target;
        })
    }

    pub fn finish_run(&self, report: &RunReport) -> Vec<StateChange> {
        self.update(|state| {
            let newly_discarded = report.discarded.saturating_sub(state.discarded_this_run);
            state.total_discarded += newly_discarded;
            state.discarded_this_run = report.discarded;
            state.is_discarding = false;
            state.current_target = None;
            match &report.outcome {
                RunOutcome::Completed => {
                    state.phase = WorkflowPhase::Completed;
                    state.last_message = Some(format!(
                        "Discarded {} items",
                        report.discarded
                    ));
                }
                RunOutcome::Failed(error) => {
                    state.phase = WorkflowPhase::Failed;
                    state.last_message = Some(error.to_string());
                }
            }
        })
    }

    /// Record that the active run was dropped.
    pub fn abort_run(&self) -> Vec<StateChange> {
        let reason = self.read(|state| state.run_reason);
        let mut changes = self.update(|state| {
            state.is_discarding = false;
            state.phase = WorkflowPhase::Idle;
            state.current_target = None;
            state.last_message = Some("Discarding aborted".to_string());
        });

        let aborted = StateChange::DiscardAborted { reason };
        self.emit(aborted.clone());
        changes.push(aborted);

        changes
    }

    /// Reset all run-related state
    pub fn reset_run_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_run_state();
        });

        let reset_event = StateChange::StateReset;
        self.emit(reset_event.clone());
        changes.push(reset_event);

        changes
    }

}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
