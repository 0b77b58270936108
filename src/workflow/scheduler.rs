use std::time::{Duration, Instant};

/// Tracks when the single pending run may take its next step.
///
/// There is never more than one pending step, so clearing the scheduler drops
/// everything an aborted run still had queued.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    next_due: Option<Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next step `delay` after `now`, replacing any earlier schedule.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.next_due = Some(now + delay);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn is_pending(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn clear(&mut self) {
        self.next_due = None;
    }
}
