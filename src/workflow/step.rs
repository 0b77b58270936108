//! The pure transition function of the discard workflow.
//!
//! [`StepContext::step`] only reads from the game. Anything that acts on the game
//! is returned as a [`SideEffect`] and executed by the driver, which also owns
//! the delay until the next step.

use crate::models::{
    DiscardTarget, ItemFilter, RuleConfiguration, RunReason, WorkflowPhase, WorkflowSettings,
};
use crate::services::dialog::{DISCARD_DIALOG_NAME, DialogMatcher, find_dialog};
use crate::services::scanner::InventoryScanner;
use crate::services::surface::{DialogHandle, DialogSurface, GearsetSource, InventorySource};
use crate::workflow::WorkflowError;
use std::time::{Duration, Instant};

/// Everything one run carries between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    pub phase: WorkflowPhase,
    pub reason: RunReason,
    pub filter: Option<ItemFilter>,
    pub target: Option<DiscardTarget>,
    /// Absolute deadline of the current target, set when its discard is issued
    pub deadline: Option<Instant>,
    pub dialog: Option<DialogHandle>,
    pub discarded: usize,
    pub started_at: Instant,
    pub error: Option<WorkflowError>,
}

impl WorkflowState {
    /// A fresh run, ready to pick its first target.
    pub fn new(reason: RunReason, filter: Option<ItemFilter>, now: Instant) -> Self {
        Self {
            phase: WorkflowPhase::IssuingDiscard,
            reason,
            filter,
            target: None,
            deadline: None,
            dialog: None,
            discarded: 0,
            started_at: now,
            error: None,
        }
    }

    /// Forget the current target and go back to picking one.
    pub(crate) fn next_target(mut self) -> Self {
        self.phase = WorkflowPhase::IssuingDiscard;
        self.target = None;
        self.deadline = None;
        self.dialog = None;
        self
    }

    pub(crate) fn fail(mut self, error: WorkflowError) -> Self {
        self.phase = WorkflowPhase::Failed;
        self.error = Some(error);
        self
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Actions against the game requested by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    Discard(DiscardTarget),
    ConfirmDialog(DialogHandle),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effect: Option<SideEffect>,
    /// Wait before the next step
    pub delay: Duration,
}

impl Transition {
    fn to(state: WorkflowState, delay: Duration) -> Self {
        Self {
            state,
            effect: None,
            delay,
        }
    }

    fn with_effect(state: WorkflowState, effect: SideEffect, delay: Duration) -> Self {
        Self {
            state,
            effect: Some(effect),
            delay,
        }
    }
}

/// Read-only inputs shared by every step of a tick.
pub struct StepContext<'a> {
    pub scanner: &'a InventoryScanner,
    pub matcher: &'a DialogMatcher,
    pub rules: &'a RuleConfiguration,
    pub settings: &'a WorkflowSettings,
}

impl StepContext<'_> {
    pub fn step<G>(&self, state: WorkflowState, game: &G, now: Instant) -> Transition
    where
        G: InventorySource + GearsetSource + DialogSurface + ?Sized,
    {
        match state.phase {
            WorkflowPhase::IssuingDiscard => self.issue_discard(state, game, now),
            WorkflowPhase::AwaitingDialog => self.await_dialog(state, game, now),
            WorkflowPhase::ConfirmingDialog => self.confirm_dialog(state),
            WorkflowPhase::VerifyingRemoval => self.verify_removal(state, game, now),
            WorkflowPhase::Idle | WorkflowPhase::Completed | WorkflowPhase::Failed => {
                Transition::to(state, Duration::ZERO)
            }
        }
    }

    fn issue_discard<G>(&self, mut state: WorkflowState, game: &G, now: Instant) -> Transition
    where
        G: InventorySource + GearsetSource + ?Sized,
    {
        let next = self
            .scanner
            .next_item_to_discard(game, game, self.rules, state.filter.as_ref());

        let Some(target) = next else {
            tracing::debug!("No more items to discard");
            state.phase = WorkflowPhase::Completed;
            state.target = None;
            state.deadline = None;
            return Transition::to(state, Duration::ZERO);
        };

        tracing::debug!(
            "Discarding {} ({})",
            self.scanner.catalog().item_name(target.item_id),
            target
        );
        state.phase = WorkflowPhase::AwaitingDialog;
        state.target = Some(target);
        state.deadline = Some(now + self.settings.discard_timeout());
        state.dialog = None;
        Transition::with_effect(
            state,
            SideEffect::Discard(target),
            self.settings.dialog_delay(),
        )
    }

    fn await_dialog<G>(&self, mut state: WorkflowState, game: &G, now: Instant) -> Transition
    where
        G: InventorySource + DialogSurface + ?Sized,
    {
        let Some(target) = state.target else {
            return Transition::to(state.next_target(), Duration::ZERO);
        };

        let found = find_dialog(
            game,
            DISCARD_DIALOG_NAME,
            self.settings.max_dialog_instances,
            self.matcher,
        );
        if let Some(handle) = found {
            tracing::trace!("Confirmation dialog found for {}", target);
            state.phase = WorkflowPhase::ConfirmingDialog;
            state.dialog = Some(handle);
            return Transition::to(state, Duration::ZERO);
        }

        if !slot_still_holds(game, &target) {
            tracing::debug!("Target {} changed before its dialog appeared", target);
            return Transition::to(state.next_target(), Duration::ZERO);
        }

        if state.deadline_passed(now) {
            tracing::warn!("No confirmation dialog appeared for {}", target);
            return Transition::to(
                state.fail(WorkflowError::Timeout(self.settings.discard_timeout())),
                Duration::ZERO,
            );
        }

        Transition::to(state, self.settings.poll_interval())
    }

    fn confirm_dialog(&self, mut state: WorkflowState) -> Transition {
        let Some(handle) = state.dialog.take() else {
            state.phase = WorkflowPhase::AwaitingDialog;
            return Transition::to(state, self.settings.poll_interval());
        };

        state.phase = WorkflowPhase::VerifyingRemoval;
        Transition::with_effect(
            state,
            SideEffect::ConfirmDialog(handle),
            self.settings.confirm_delay(),
        )
    }

    fn verify_removal<G>(&self, mut state: WorkflowState, game: &G, now: Instant) -> Transition
    where
        G: InventorySource + ?Sized,
    {
        let Some(target) = state.target else {
            return Transition::to(state.next_target(), Duration::ZERO);
        };

        if !slot_still_holds(game, &target) {
            tracing::debug!("Verified removal of {}", target);
            state.discarded += 1;
            return Transition::to(state.next_target(), Duration::ZERO);
        }

        if state.deadline_passed(now) {
            tracing::warn!("{} is still in its slot after confirming", target);
            return Transition::to(
                state.fail(WorkflowError::Timeout(self.settings.discard_timeout())),
                Duration::ZERO,
            );
        }

        Transition::to(state, self.settings.poll_interval())
    }
}

/// Whether the slot still holds the item that was targeted.
pub fn slot_still_holds<I>(inventory: &I, target: &DiscardTarget) -> bool
where
    I: InventorySource + ?Sized,
{
    inventory
        .read_slot(target.slot)
        .is_some_and(|slot| !slot.is_empty() && slot.item_id == target.item_id)
}
