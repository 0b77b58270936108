//! Workflow module - Drives one discard run against the live game.
//!
//! A run repeatedly picks the head of a fresh scan, issues the discard, waits for
//! and confirms the dialog, then verifies the slot changed. The transition logic
//! lives in [`step`] as a pure function; [`DiscardWorkflow`] owns the single
//! active run, executes side effects, and decides when the next step is due.
//!
//! # Cancellation
//!
//! Starting a new run or calling [`DiscardWorkflow::abort`] drops the old run's
//! state and its pending step together. An aborted run never emits another
//! side effect, so no discard can fire against a slot it captured.
//!
//! # Usage Example
//!
//! ```ignore
//! let mut workflow = DiscardWorkflow::new(scanner, matcher, metrics);
//! workflow.start(RunReason::Manual, None, Instant::now());
//!
//! // On every frame of the host
//! if let Some(report) = workflow.tick(&mut game, &rules, &settings, Instant::now()) {
//!     println!("{report}");
//! }
//! ```

pub mod scheduler;
pub mod step;

pub use scheduler::Scheduler;
pub use step::{SideEffect, StepContext, Transition, WorkflowState, slot_still_holds};

use crate::metrics::Metrics;
use crate::models::{ItemFilter, RuleConfiguration, RunReason, WorkflowPhase, WorkflowSettings};
use crate::services::dialog::DialogMatcher;
use crate::services::scanner::InventoryScanner;
use crate::services::surface::GameClient;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Steps executed per tick before yielding back to the host.
pub const MAX_STEPS_PER_TICK: usize = 16;

/// Errors that end a discard run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Discarding probably failed due to an error (no change after {}s)", .0.as_secs())]
    Timeout(Duration),

    #[error("Refusing to discard blacklisted item {0}")]
    InvalidDiscardTarget(u32),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(WorkflowError),
}

/// Terminal notification of a run, produced exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reason: RunReason,
    pub outcome: RunOutcome,
    pub discarded: usize,
    pub duration: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            RunOutcome::Completed => write!(
                f,
                "{} run completed, {} items discarded",
                self.reason, self.discarded
            ),
            RunOutcome::Failed(error) => write!(
                f,
                "{} run failed after {} items: {}",
                self.reason, self.discarded, error
            ),
        }
    }
}

/// Owner of the single active discard run.
pub struct DiscardWorkflow {
    scanner: InventoryScanner,
    matcher: DialogMatcher,
    metrics: Arc<Metrics>,
    state: Option<WorkflowState>,
    scheduler: Scheduler,
}

impl DiscardWorkflow {
    pub fn new(scanner: InventoryScanner, matcher: DialogMatcher, metrics: Arc<Metrics>) -> Self {
        Self {
            scanner,
            matcher,
            metrics,
            state: None,
            scheduler: Scheduler::new(),
        }
    }

    pub fn scanner(&self) -> &InventoryScanner {
        &self.scanner
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Start a new run, first step due immediately.
    ///
    /// Returns the state of the run this one replaced, if any.
    pub fn start(
        &mut self,
        reason: RunReason,
        filter: Option<ItemFilter>,
        now: Instant,
    ) -> Option<WorkflowState> {
        let aborted = self.abort();

        tracing::info!(
            "Starting {} discard run{}",
            reason,
            filter
                .as_ref()
                .map(|f| format!(" restricted to {} items", f.len()))
                .unwrap_or_default()
        );
        self.state = Some(WorkflowState::new(reason, filter, now));
        self.scheduler.schedule(now, Duration::ZERO);

        aborted
    }

    /// Drop the active run and its pending step.
    pub fn abort(&mut self) -> Option<WorkflowState> {
        self.scheduler.clear();
        let aborted = self.state.take()?;
        tracing::info!(
            "Aborted {} discard run in phase '{}'",
            aborted.reason,
            aborted.phase
        );
        self.metrics.record_run_aborted();
        Some(aborted)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state
            .as_ref()
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    pub fn state(&self) -> Option<&WorkflowState> {
        self.state.as_ref()
    }

    /// When the next step is due, if a run is active.
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Run every step that is due at `now`.
    ///
    /// Returns the report of the run when it reached a terminal phase during this tick.
    pub fn tick<G>(
        &mut self,
        game: &mut G,
        rules: &RuleConfiguration,
        settings: &WorkflowSettings,
        now: Instant,
    ) -> Option<RunReport>
    where
        G: GameClient + ?Sized,
    {
        for _ in 0..MAX_STEPS_PER_TICK {
            if !self.scheduler.is_due(now) {
                return None;
            }
            let state = self.state.take()?;
            let previous_phase = state.phase;
            let previous_discarded = state.discarded;

            let ctx = StepContext {
                scanner: &self.scanner,
                matcher: &self.matcher,
                rules,
                settings,
            };
            let Transition {
                state,
                effect,
                delay,
            } = ctx.step(state, &*game, now);

            if state.discarded > previous_discarded {
                self.metrics.record_item_discarded();
            }
            if previous_phase == WorkflowPhase::AwaitingDialog
                && state.phase == WorkflowPhase::IssuingDiscard
            {
                self.metrics.record_stale_target();
            }

            let state = match effect {
                Some(effect) => self.apply(effect, state, game, rules),
                None => state,
            };

            if state.phase.is_terminal() {
                self.scheduler.clear();
                return Some(self.finish(state, now));
            }

            self.scheduler.schedule(now, delay);
            self.state = Some(state);
        }

        tracing::trace!("Step budget exhausted, continuing next tick");
        None
    }

    fn apply<G>(
        &self,
        effect: SideEffect,
        state: WorkflowState,
        game: &mut G,
        rules: &RuleConfiguration,
    ) -> WorkflowState
    where
        G: GameClient + ?Sized,
    {
        match effect {
            SideEffect::Discard(target) => {
                if self.scanner.lists().is_blacklisted(target.item_id, Some(rules)) {
                    tracing::error!(
                        "Refusing to discard {}: item is blacklisted",
                        target
                    );
                    self.metrics.record_refused_target();
                    return state.fail(WorkflowError::InvalidDiscardTarget(target.item_id));
                }
                game.discard(target.slot);
                state
            }
            SideEffect::ConfirmDialog(handle) => {
                game.confirm(handle);
                self.metrics.record_dialog_confirmed();
                state
            }
        }
    }

    fn finish(&self, state: WorkflowState, now: Instant) -> RunReport {
        let duration = now.saturating_duration_since(state.started_at);

        let outcome = match state.error {
            None => {
                tracing::info!(
                    "{} discard run completed: {} items discarded",
                    state.reason,
                    state.discarded
                );
                self.metrics.record_run_completed(duration);
                RunOutcome::Completed
            }
            Some(error) => {
                tracing::error!("{} discard run failed: {}", state.reason, error);
                if matches!(error, WorkflowError::Timeout(_)) {
                    self.metrics.record_timeout();
                }
                self.metrics.record_run_failed(duration);
                RunOutcome::Failed(error)
            }
        };

        RunReport {
            reason: state.reason,
            outcome,
            discarded: state.discarded,
            duration,
        }
    }
}
