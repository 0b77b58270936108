//! Automation module - Connects the discard workflow to an external automation host.
//!
//! The host (a retainer automation tool, say) owns two post-process hooks. For each
//! [`PostProcessSubject`] it asks whether we want to run ([`HostEvent::PostProcessStep`]),
//! we answer by requesting post-processing, and it later hands control over
//! ([`HostEvent::PostProcessReady`]). When that run ends, control goes back with
//! [`AutomationHost::finish_post_process`]. Manual runs skip the host entirely
//! and report through the [`Notifier`].
//!
//! Every run reaches exactly one of `finish_post_process` or a notifier message,
//! including runs aborted by a newer request, a logout or [`AutomationCoordinator::stop`].

use crate::models::{ItemFilter, PostProcessSubject, RunReason};
use crate::services::surface::GameClient;
use crate::state::StateManager;
use crate::workflow::{DiscardWorkflow, RunOutcome, RunReport, WorkflowState};
use std::time::Instant;

/// Message shown when a manual run finished without error.
pub const DONE_MESSAGE: &str = "Done discarding.";

/// Message shown when a manual run was replaced or cancelled.
pub const ABORTED_MESSAGE: &str = "Discarding aborted.";

/// The external automation host offering post-process hooks.
#[cfg_attr(test, mockall::automock)]
pub trait AutomationHost {
    fn register_hooks(&mut self, subject: PostProcessSubject);

    fn unregister_hooks(&mut self, subject: PostProcessSubject);

    /// Tell the host we want to run once it is ready.
    fn request_post_process(&mut self, subject: PostProcessSubject);

    /// Hand control back to the host.
    fn finish_post_process(&mut self, subject: PostProcessSubject);
}

/// User-facing chat output.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn print(&mut self, message: &str);

    fn print_error(&mut self, message: &str);
}

/// Callbacks delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The host asks whether post-processing is wanted
    PostProcessStep(PostProcessSubject),
    /// The host hands over control for post-processing
    PostProcessReady(PostProcessSubject),
    /// The character logged out
    Logout,
}

/// Routes run requests and terminal notifications between the host, the user
/// and the [`DiscardWorkflow`].
pub struct AutomationCoordinator<H, N> {
    host: H,
    notifier: N,
    workflow: DiscardWorkflow,
    state: StateManager,
    hooks_registered: bool,
}

impl<H, N> AutomationCoordinator<H, N>
where
    H: AutomationHost,
    N: Notifier,
{
    pub fn new(host: H, notifier: N, workflow: DiscardWorkflow, state: StateManager) -> Self {
        Self {
            host,
            notifier,
            workflow,
            state,
            hooks_registered: false,
        }
    }

    /// Register the post-process hooks for every subject.
    pub fn start(&mut self) {
        if self.hooks_registered {
            return;
        }
        for subject in PostProcessSubject::ALL {
            self.host.register_hooks(subject);
        }
        self.hooks_registered = true;
        tracing::info!("Automation hooks registered");
    }

    /// Unregister the hooks and abort any active run.
    pub fn stop(&mut self) {
        self.abort();
        if !self.hooks_registered {
            return;
        }
        for subject in PostProcessSubject::ALL {
            self.host.unregister_hooks(subject);
        }
        self.hooks_registered = false;
        tracing::info!("Automation hooks unregistered");
    }

    /// Decide whether post-processing is wanted for `subject` and, if so, request it.
    pub fn check_ready<G>(&mut self, subject: PostProcessSubject, game: &G) -> bool
    where
        G: GameClient + ?Sized,
    {
        let rules = self.state.rules();

        if !rules.post_process_enabled(subject) {
            tracing::debug!("Post-process for {} is disabled", subject);
            return false;
        }

        let Some(character) = game.current_character() else {
            tracing::debug!("No character logged in, skipping {}", subject);
            return false;
        };
        if rules.is_character_excluded(character) {
            tracing::info!("Character {} is excluded from {} discards", character, subject);
            return false;
        }

        let queue = self.workflow.scanner().scan(game, game, &rules, None);
        if queue.is_empty() {
            tracing::debug!("Nothing to discard for {}", subject);
            return false;
        }

        tracing::info!(
            "Requesting {} post-process for {} items",
            subject,
            queue.len()
        );
        self.host.request_post_process(subject);
        true
    }

    /// Start a post-process run with no filter.
    pub fn do_post_process(&mut self, subject: PostProcessSubject, now: Instant) {
        self.start_run(RunReason::PostProcess(subject), None, now);
    }

    /// Start a run requested by the user, optionally restricted to a selection.
    pub fn start_manual(&mut self, filter: Option<ItemFilter>, now: Instant) {
        self.start_run(RunReason::Manual, filter, now);
    }

    /// Cancel the active run, notifying its originator.
    pub fn abort(&mut self) {
        if let Some(aborted) = self.workflow.abort() {
            self.notify_aborted(&aborted);
        }
    }

    pub fn handle_event<G>(&mut self, event: HostEvent, game: &G, now: Instant)
    where
        G: GameClient + ?Sized,
    {
        tracing::debug!("Host event: {:?}", event);
        match event {
            HostEvent::PostProcessStep(subject) => {
                self.check_ready(subject, game);
            }
            HostEvent::PostProcessReady(subject) => self.do_post_process(subject, now),
            HostEvent::Logout => self.abort(),
        }
    }

    /// Advance the active run and route its report when it ends.
    pub fn tick<G>(&mut self, game: &mut G, now: Instant) -> Option<RunReport>
    where
        G: GameClient + ?Sized,
    {
        if !self.workflow.is_running() {
            return None;
        }

        let rules = self.state.rules();
        let settings = self.state.settings();
        let report = self.workflow.tick(game, &rules, &settings, now);

        let changes = match &report {
            Some(report) => {
                let changes = self.state.finish_run(report);
                self.notify_finished(report);
                changes
            }
            None => self
                .workflow
                .state()
                .map(|state| self.state.sync_run(state))
                .unwrap_or_default(),
        };
        self.workflow
            .metrics()
            .record_state_broadcasts(changes.len());

        report
    }

    pub fn is_running(&self) -> bool {
        self.workflow.is_running()
    }

    /// Ids currently selected for automatic discarding.
    pub fn items_to_discard(&self) -> Vec<u32> {
        self.state.read(|state| state.items_to_discard())
    }

    pub fn workflow(&self) -> &DiscardWorkflow {
        &self.workflow
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn start_run(&mut self, reason: RunReason, filter: Option<ItemFilter>, now: Instant) {
        if let Some(aborted) = self.workflow.start(reason, filter, now) {
            self.notify_aborted(&aborted);
        }
        self.state.start_run(reason);
    }

    fn notify_aborted(&mut self, aborted: &WorkflowState) {
        self.state.abort_run();
        match aborted.reason {
            RunReason::PostProcess(subject) => self.host.finish_post_process(subject),
            RunReason::Manual => self.notifier.print(ABORTED_MESSAGE),
        }
    }

    fn notify_finished(&mut self, report: &RunReport) {
        match (report.reason, &report.outcome) {
            (RunReason::PostProcess(subject), RunOutcome::Completed) => {
                self.host.finish_post_process(subject);
            }
            (RunReason::PostProcess(subject), RunOutcome::Failed(error)) => {
                self.notifier.print_error(&error.to_string());
                self.host.finish_post_process(subject);
            }
            (RunReason::Manual, RunOutcome::Completed) => self.notifier.print(DONE_MESSAGE),
            (RunReason::Manual, RunOutcome::Failed(error)) => {
                self.notifier.print_error(&error.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::models::{
        CharacterInfo, ContainerId, GameStrings, InventorySlot, ItemCatalog,
        ItemDefinition, SlotRef,
    };
    use crate::services::{
        CharacterSource, DialogHandle, DialogInstance, DialogMatcher, DialogSurface,
        DiscardInvoker, GearsetSource, InternalLists, InventoryScanner, InventorySource,
        RecordedInventory,
    };
    use mockall::predicate::eq;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    /// Removes the discarded item as soon as the dialog is confirmed.
    #[derive(Default)]
    struct Game {
        inventory: RecordedInventory,
        pending: Option<SlotRef>,
        dialog_open: bool,
        /// Discards never open a dialog
        swallow_discards: bool,
    }

    impl InventorySource for Game {
        fn read_container(&self, container: ContainerId) -> Vec<InventorySlot> {
            self.inventory.read_container(container)
        }

        fn read_slot(&self, slot: SlotRef) -> Option<InventorySlot> {
            self.inventory.read_slot(slot)
        }
    }

    impl GearsetSource for Game {
        fn gearset_items(&self) -> Option<HashSet<u32>> {
            self.inventory.gearset_items()
        }
    }

    impl CharacterSource for Game {
        fn current_character(&self) -> Option<u64> {
            self.inventory.current_character()
        }
    }

    impl DialogSurface for Game {
        fn dialog(&self, _name: &str, index: usize) -> Option<DialogInstance> {
            (index == 1 && self.dialog_open).then(|| DialogInstance {
                handle: DialogHandle(1),
                is_visible: true,
                is_ready: true,
                text: "Discard Copper Ore?".to_string(),
            })
        }

        fn confirm(&mut self, _handle: DialogHandle) {
            self.dialog_open = false;
            if let Some(slot) = self.pending.take() {
                self.inventory.clear_slot(slot);
            }
        }
    }

    impl DiscardInvoker for Game {
        fn discard(&mut self, slot: SlotRef) {
            if self.swallow_discards {
                return;
            }
            self.pending = Some(slot);
            self.dialog_open = true;
        }
    }

    fn game_with_ore(character: u64) -> Game {
        let mut inventory = RecordedInventory::new().with_slot(InventorySlot::new(
            SlotRef::new(ContainerId::Inventory1, 0),
            500,
            1,
        ));
        inventory.set_character(Some(character));
        Game {
            inventory,
            ..Game::default()
        }
    }

    fn workflow() -> DiscardWorkflow {
        let catalog = ItemCatalog::new(vec![ItemDefinition {
            item_id: 500,
            name: "Copper Ore".to_string(),
            item_level: 1,
            rarity: 1,
            is_unique: false,
            is_untradable: false,
            is_indisposable: false,
            ui_category: 44,
            ui_category_name: "Ingredient".to_string(),
            equip_slot_category: 0,
            can_be_bought_from_vendor: false,
        }])
        .unwrap();
        DiscardWorkflow::new(
            InventoryScanner::new(Arc::new(catalog), Arc::new(InternalLists::builtin())),
            DialogMatcher::new(&GameStrings::default()).unwrap(),
            Arc::new(Metrics::new()),
        )
    }

    fn state_with_rules(after_venture: bool) -> StateManager {
        let state = StateManager::new();
        state.update_rules(|rules| {
            rules.run_after_venture = after_venture;
            rules.discarding_items.insert(500);
        });
        state
    }

    fn drive<H: AutomationHost, N: Notifier>(
        coordinator: &mut AutomationCoordinator<H, N>,
        game: &mut Game,
        start: Instant,
    ) -> Option<RunReport> {
        let mut now = start;
        for _ in 0..50 {
            if let Some(report) = coordinator.tick(game, now) {
                return Some(report);
            }
            now += Duration::from_millis(100);
        }
        None
    }

    #[test]
    fn test_start_and_stop_register_hooks() {
        let mut host = MockAutomationHost::new();
        host.expect_register_hooks().times(2).return_const(());
        host.expect_unregister_hooks().times(2).return_const(());
        let notifier = MockNotifier::new();

        let mut coordinator =
            AutomationCoordinator::new(host, notifier, workflow(), StateManager::new());
        coordinator.start();
        coordinator.start();
        coordinator.stop();
        coordinator.stop();
    }

    #[test]
    fn test_check_ready_requires_toggle() {
        let mut host = MockAutomationHost::new();
        host.expect_request_post_process().never();

        let mut coordinator = AutomationCoordinator::new(
            host,
            MockNotifier::new(),
            workflow(),
            state_with_rules(false),
        );
        assert!(!coordinator.check_ready(PostProcessSubject::RetainerVenture, &game_with_ore(1)));
    }

    #[test]
    fn test_check_ready_skips_excluded_character() {
        let mut host = MockAutomationHost::new();
        host.expect_request_post_process().never();
        let state = state_with_rules(true);
        state.exclude_character(CharacterInfo::new(7));

        let mut coordinator =
            AutomationCoordinator::new(host, MockNotifier::new(), workflow(), state);
        assert!(!coordinator.check_ready(PostProcessSubject::RetainerVenture, &game_with_ore(7)));
        assert!(!coordinator.is_running());
    }

    #[test]
    fn test_check_ready_requires_candidates() {
        let mut host = MockAutomationHost::new();
        host.expect_request_post_process().never();

        let mut coordinator = AutomationCoordinator::new(
            host,
            MockNotifier::new(),
            workflow(),
            state_with_rules(true),
        );
        let mut game = Game::default();
        game.inventory.set_character(Some(1));
        assert!(!coordinator.check_ready(PostProcessSubject::RetainerVenture, &game));
    }

    #[test]
    fn test_check_ready_requires_known_character() {
        let mut host = MockAutomationHost::new();
        host.expect_request_post_process().never();

        let mut coordinator = AutomationCoordinator::new(
            host,
            MockNotifier::new(),
            workflow(),
            state_with_rules(true),
        );
        let mut game = game_with_ore(1);
        game.inventory.set_character(None);
        assert!(!coordinator.check_ready(PostProcessSubject::RetainerVenture, &game));
    }

    #[test]
    fn test_post_process_round_trip() {
        let mut host = MockAutomationHost::new();
        host.expect_request_post_process()
            .with(eq(PostProcessSubject::RetainerVenture))
            .times(1)
            .return_const(());
        host.expect_finish_post_process()
            .with(eq(PostProcessSubject::RetainerVenture))
            .times(1)
            .return_const(());
        let mut notifier = MockNotifier::new();
        notifier.expect_print().never();
        notifier.expect_print_error().never();

        let mut coordinator =
            AutomationCoordinator::new(host, notifier, workflow(), state_with_rules(true));
        let mut game = game_with_ore(1);
        let now = Instant::now();

        coordinator.handle_event(
            HostEvent::PostProcessStep(PostProcessSubject::RetainerVenture),
            &game,
            now,
        );
        coordinator.handle_event(
            HostEvent::PostProcessReady(PostProcessSubject::RetainerVenture),
            &game,
            now,
        );
        assert!(coordinator.is_running());

        let report = drive(&mut coordinator, &mut game, now).unwrap();
        assert!(report.is_success());
        assert_eq!(report.discarded, 1);
        assert!(!coordinator.is_running());
        assert_eq!(coordinator.state().snapshot().total_discarded, 1);
    }

    #[test]
    fn test_manual_run_prints_done() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_print()
            .with(eq(DONE_MESSAGE))
            .times(1)
            .return_const(());

        let mut coordinator = AutomationCoordinator::new(
            MockAutomationHost::new(),
            notifier,
            workflow(),
            state_with_rules(false),
        );
        let mut game = game_with_ore(1);
        let now = Instant::now();

        coordinator.start_manual(None, now);
        assert!(drive(&mut coordinator, &mut game, now).is_some());
    }

    #[test]
    fn test_failed_post_process_reports_error_and_finishes() {
        let mut host = MockAutomationHost::new();
        host.expect_finish_post_process()
            .with(eq(PostProcessSubject::CharacterLogout))
            .times(1)
            .return_const(());
        let mut notifier = MockNotifier::new();
        notifier
            .expect_print_error()
            .withf(|message: &str| message.starts_with("Discarding probably failed"))
            .times(1)
            .return_const(());

        let mut coordinator =
            AutomationCoordinator::new(host, notifier, workflow(), state_with_rules(false));
        let mut game = game_with_ore(1);
        game.swallow_discards = true;

        let now = Instant::now();
        coordinator.do_post_process(PostProcessSubject::CharacterLogout, now);

        assert!(coordinator.tick(&mut game, now).is_none());
        let report = coordinator.tick(&mut game, now + Duration::from_secs(16)).unwrap();
        assert!(!report.is_success());
        assert!(coordinator.tick(&mut game, now + Duration::from_secs(32)).is_none());
    }

    #[test]
    fn test_superseded_post_process_is_finished() {
        let mut host = MockAutomationHost::new();
        host.expect_finish_post_process()
            .with(eq(PostProcessSubject::RetainerVenture))
            .times(1)
            .return_const(());

        let mut coordinator = AutomationCoordinator::new(
            host,
            MockNotifier::new(),
            workflow(),
            state_with_rules(true),
        );
        let now = Instant::now();

        coordinator.do_post_process(PostProcessSubject::RetainerVenture, now);
        coordinator.start_manual(None, now);
        assert!(coordinator.is_running());
        assert_eq!(
            coordinator.workflow().state().map(|state| state.reason),
            Some(RunReason::Manual)
        );
    }

    #[test]
    fn test_logout_aborts_manual_run() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_print()
            .with(eq(ABORTED_MESSAGE))
            .times(1)
            .return_const(());

        let mut coordinator = AutomationCoordinator::new(
            MockAutomationHost::new(),
            notifier,
            workflow(),
            state_with_rules(false),
        );
        let mut game = game_with_ore(1);
        let now = Instant::now();

        coordinator.start_manual(None, now);
        coordinator.tick(&mut game, now);
        assert!(game.pending.is_some());

        coordinator.handle_event(HostEvent::Logout, &game, now);
        assert!(!coordinator.is_running());
        assert!(coordinator.tick(&mut game, now + Duration::from_secs(1)).is_none());
        assert_eq!(
            game.read_slot(SlotRef::new(ContainerId::Inventory1, 0))
                .map(|slot| slot.item_id),
            Some(500)
        );
    }

    #[test]
    fn test_items_to_discard_reflects_rules() {
        let coordinator = AutomationCoordinator::new(
            MockAutomationHost::new(),
            MockNotifier::new(),
            workflow(),
            state_with_rules(false),
        );
        assert_eq!(coordinator.items_to_discard(), vec![500]);
    }
}
