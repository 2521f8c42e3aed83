//! Per-player attack queue and combo window bookkeeping.

use skirmish_common::{TaskId, TIME_EPSILON};
use std::collections::VecDeque;

use super::action::{ActionKind, QueuedAction};

/// FIFO of accepted actions plus the combo window that produced them.
#[derive(Debug, Clone, Default)]
pub struct AttackQueue {
    pending: VecDeque<QueuedAction>,
    /// The single executor draining this queue, if one is running.
    executor: Option<TaskId>,
    /// Qualifying clicks since the window opened.
    click_count: u32,
    /// Time of the first click of the open window.
    window_start: Option<f64>,
    /// Set when the second-click escalation was accepted in this window.
    link_armed: bool,
}

impl AttackQueue {
    /// Appends an action.
    pub fn push(&mut self, action: QueuedAction) {
        self.pending.push_back(action);
    }

    /// Takes the oldest action.
    pub fn pop(&mut self) -> Option<QueuedAction> {
        self.pending.pop_front()
    }

    /// Pending actions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.pending.iter()
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending actions of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: ActionKind) -> usize {
        self.pending.iter().filter(|action| action.kind == kind).count()
    }

    /// The running executor.
    #[must_use]
    pub fn executor(&self) -> Option<TaskId> {
        self.executor
    }

    /// Records the running executor.
    pub fn set_executor(&mut self, executor: Option<TaskId>) {
        self.executor = executor;
    }

    /// Clicks counted in the open window.
    #[must_use]
    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    /// Whether the combo window is open at `now`.
    #[must_use]
    pub fn window_open(&self, now: f64, window: f64) -> bool {
        self.window_start
            .is_some_and(|start| now - start <= window + TIME_EPSILON)
    }

    /// Opens a new window with its first click.
    pub fn open_window(&mut self, now: f64) {
        self.window_start = Some(now);
        self.click_count = 1;
        self.link_armed = false;
    }

    /// Counts one more click and returns the new count.
    pub fn count_click(&mut self) -> u32 {
        self.click_count = self.click_count.saturating_add(1);
        self.click_count
    }

    /// Whether the next escalation is a forced link.
    #[must_use]
    pub fn link_armed(&self) -> bool {
        self.link_armed
    }

    /// Arms or disarms the forced link.
    pub fn set_link_armed(&mut self, armed: bool) {
        self.link_armed = armed;
    }

    /// Closes the window if it has lapsed. Returns true if it was closed.
    pub fn close_lapsed_window(&mut self, now: f64, window: f64) -> bool {
        if self.window_start.is_some() && !self.window_open(now, window) {
            self.window_start = None;
            self.click_count = 0;
            self.link_armed = false;
            return true;
        }
        false
    }

    /// Drops everything, including the executor handle.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
