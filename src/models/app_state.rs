use crate::models::config::{RuleConfiguration, WorkflowSettings};
use crate::models::inventory::DiscardTarget;
use std::fmt;

/// The two host hooks through which an automation host defers cleanup work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostProcessSubject {
    /// Runs after a retainer venture was collected
    RetainerVenture,
    /// Runs before the character is logged out
    CharacterLogout,
}

impl PostProcessSubject {
    pub const ALL: [PostProcessSubject; 2] = [
        PostProcessSubject::RetainerVenture,
        PostProcessSubject::CharacterLogout,
    ];
}

impl fmt::Display for PostProcessSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostProcessSubject::RetainerVenture => write!(f, "retainer-venture"),
            PostProcessSubject::CharacterLogout => write!(f, "character-logout"),
        }
    }
}

/// Who started a run, and therefore who is told when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunReason {
    Manual,
    PostProcess(PostProcessSubject),
}

impl fmt::Display for RunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReason::Manual => write!(f, "manual"),
            RunReason::PostProcess(subject) => write!(f, "post-process ({subject})"),
        }
    }
}

/// Phases of the discard workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowPhase {
    #[default]
    Idle,
    IssuingDiscard,
    AwaitingDialog,
    ConfirmingDialog,
    VerifyingRemoval,
    Completed,
    Failed,
}

impl WorkflowPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowPhase::Completed | WorkflowPhase::Failed)
    }

    pub fn is_active(self) -> bool {
        !matches!(
            self,
            WorkflowPhase::Idle | WorkflowPhase::Completed | WorkflowPhase::Failed
        )
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowPhase::Idle => "Idle",
            WorkflowPhase::IssuingDiscard => "Issuing discard",
            WorkflowPhase::AwaitingDialog => "Awaiting dialog",
            WorkflowPhase::ConfirmingDialog => "Confirming dialog",
            WorkflowPhase::VerifyingRemoval => "Verifying removal",
            WorkflowPhase::Completed => "Completed",
            WorkflowPhase::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Shared application state.
///
/// Holds the live [`RuleConfiguration`] read by the scanner on every tick, plus a
/// mirror of the discard workflow's progress for observers. The workflow itself
/// owns its authoritative state; this copy is only ever written by the
/// coordinator after each tick.
///
/// Never access `AppState` directly; go through
/// [`StateManager`](crate::state::StateManager).
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Configuration
    pub rules: RuleConfiguration,
    pub workflow: WorkflowSettings,

    // Runtime state
    pub is_discarding: bool,
    pub run_reason: Option<RunReason>,
    pub phase: WorkflowPhase,
    pub current_target: Option<DiscardTarget>,

    // Results
    pub discarded_this_run: usize,
    pub total_discarded: usize,
    pub last_message: Option<String>,
}

impl AppState {
    /// Whether a discard run is in progress.
    pub fn is_running(&self) -> bool {
        self.is_discarding
    }

    /// Ids currently selected for automatic discarding.
    pub fn items_to_discard(&self) -> Vec<u32> {
        self.rules.discarding_items.iter().copied().collect()
    }

    /// Reset all run-related state to initial values.
    pub fn reset_run_state(&mut self) {
        self.is_discarding = false;
        self.run_reason = None;
        self.phase = WorkflowPhase::Idle;
        self.current_target = None;
        self.discarded_this_run = 0;
        self.last_message = None;
    }
}
