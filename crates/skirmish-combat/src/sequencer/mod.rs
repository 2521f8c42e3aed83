//! Attack sequencer: player input to queued actions.
//!
//! The sequencer is a small state machine (`Idle`, `AwaitingCombo`,
//! `Executing`) sitting in front of a FIFO [`AttackQueue`]:
//! - The first primary click opens a combo window and queues a [`Slash`]
//! - The second and third clicks inside the window queue one escalation each
//! - Further clicks are counted but queue nothing
//! - Every action kind has its own cooldown; a cooling action is dropped
//!   before it reaches the queue
//! - A single [`ActionExecutor`] drains the queue one action at a time
//!
//! [`Slash`]: ActionKind::Slash

mod action;
mod charge;
mod executor;
mod queue;

pub use action::{ActionFamily, ActionKind, QueuedAction};
pub use charge::{charge_tier, ChargeState};
pub use executor::{perform_action, ActionEffect, ActionExecutor};
pub use queue::AttackQueue;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, TaskId};
use tracing::{debug, trace};

use crate::config::SequencerConfig;
use crate::cooldown::CooldownBook;
use crate::projectile::RedirectOutcome;

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    /// Nothing queued, no window open.
    Idle,
    /// A combo window is open or actions wait for an executor.
    AwaitingCombo,
    /// An executor is draining the queue.
    Executing,
}

/// Why an input produced no queued action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The action's cooldown has not elapsed.
    OnCooldown,
    /// An uninterruptible action is queued or running.
    Blocked,
    /// A click past the last recognized combo threshold.
    BeyondThreshold,
    /// Too many live summons.
    AtCapacity,
}

/// Result of offering an action to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The action joined the queue.
    Queued {
        /// Queued action
        kind: ActionKind,
        /// Whether it skipped its cooldown as a forced combo link
        bypassed: bool,
    },
    /// Nothing was queued.
    Dropped(DropReason),
}

impl EnqueueOutcome {
    /// Whether an action was queued.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// What one input frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// An action was offered to the queue.
    Enqueue(EnqueueOutcome),
    /// A seeker in flight was asked to redirect.
    Redirect(RedirectOutcome),
    /// The secondary attack started charging.
    ChargeStarted,
}

/// Per-player input-to-action pipeline.
#[derive(Debug, Clone)]
pub struct AttackSequencer {
    owner: EntityId,
    config: SequencerConfig,
    state: SequencerState,
    queue: AttackQueue,
    cooldowns: CooldownBook<ActionKind>,
    charge: ChargeState,
    executing: Option<ActionKind>,
}

impl AttackSequencer {
    /// Creates an idle sequencer for `owner`.
    #[must_use]
    pub fn new(owner: EntityId, config: SequencerConfig) -> Self {
        Self {
            owner,
            config,
            state: SequencerState::Idle,
            queue: AttackQueue::default(),
            cooldowns: CooldownBook::new(),
            charge: ChargeState::default(),
            executing: None,
        }
    }

    /// Player this sequencer belongs to.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// The pending queue.
    #[must_use]
    pub fn queue(&self) -> &AttackQueue {
        &self.queue
    }

    /// Kinds of the pending actions, oldest first.
    #[must_use]
    pub fn pending_kinds(&self) -> Vec<ActionKind> {
        self.queue.iter().map(|action| action.kind).collect()
    }

    /// Per-action cooldowns.
    #[must_use]
    pub fn cooldowns(&self) -> &CooldownBook<ActionKind> {
        &self.cooldowns
    }

    /// Per-action cooldowns, mutably.
    pub fn cooldowns_mut(&mut self) -> &mut CooldownBook<ActionKind> {
        &mut self.cooldowns
    }

    /// Charge sub-state.
    #[must_use]
    pub fn charge(&self) -> &ChargeState {
        &self.charge
    }

    /// Action the executor is running, if any.
    #[must_use]
    pub fn executing(&self) -> Option<ActionKind> {
        self.executing
    }

    /// A primary click. Opens a combo window or escalates the open one.
    pub fn press_primary(&mut self, aim: Vec2, now: f64, cooldown_divisor: f64) -> EnqueueOutcome {
        if !self.queue.window_open(now, self.config.combo_window) {
            let outcome = self.accept(QueuedAction::new(ActionKind::Slash, aim, now), now, cooldown_divisor);
            if outcome.is_queued() {
                self.queue.open_window(now);
            }
            self.refresh(now);
            return outcome;
        }

        let click = self.queue.count_click();
        let Some(kind) = ActionKind::escalation_for_click(click) else {
            trace!("{} click {click} past the last threshold", self.owner);
            return EnqueueOutcome::Dropped(DropReason::BeyondThreshold);
        };

        // The third click is a forced link once the second was accepted.
        let bypass = kind == ActionKind::Cleave && self.queue.link_armed();
        let outcome = self.accept(
            QueuedAction::new(kind, aim, now).with_bypass(bypass),
            now,
            cooldown_divisor,
        );
        if kind == ActionKind::AegisSurge {
            self.queue.set_link_armed(outcome.is_queued());
        }
        self.refresh(now);
        outcome
    }

    /// Offers a base action outside the primary combo.
    pub fn request(
        &mut self,
        kind: ActionKind,
        aim: Vec2,
        now: f64,
        cooldown_divisor: f64,
    ) -> EnqueueOutcome {
        let outcome = self.accept(QueuedAction::new(kind, aim, now), now, cooldown_divisor);
        self.refresh(now);
        outcome
    }

    /// Starts charging the secondary attack.
    pub fn begin_charge(&mut self, now: f64) {
        self.charge.begin(now);
    }

    /// Releases the charge and queues a volley of the reached tier.
    pub fn release_charge(
        &mut self,
        aim: Vec2,
        now: f64,
        cooldown_divisor: f64,
    ) -> Option<EnqueueOutcome> {
        let held = self.charge.release(now)?;
        let tier = charge_tier(held, &self.config.charge_bounds);
        debug!("{} released charge after {held:.2}s: tier {tier}", self.owner);
        let action = QueuedAction::new(ActionKind::ChargedVolley, aim, now).with_tier(tier);
        let outcome = self.accept(action, now, cooldown_divisor);
        self.refresh(now);
        Some(outcome)
    }

    fn blocked(&self) -> bool {
        self.executing.is_some_and(ActionKind::is_uninterruptible)
            || self.queue.iter().any(|action| action.kind.is_uninterruptible())
    }

    fn accept(&mut self, action: QueuedAction, now: f64, cooldown_divisor: f64) -> EnqueueOutcome {
        let kind = action.kind;
        if !kind.is_escalation() && self.blocked() {
            trace!("{} dropped {kind:?}: blocked", self.owner);
            return EnqueueOutcome::Dropped(DropReason::Blocked);
        }
        if !action.bypassed {
            if !self.cooldowns.is_ready(kind, now) {
                trace!("{} dropped {kind:?}: cooling down", self.owner);
                return EnqueueOutcome::Dropped(DropReason::OnCooldown);
            }
            let cooldown = kind.config(&self.config).cooldown / cooldown_divisor.max(f64::EPSILON);
            self.cooldowns.start(kind, now, cooldown);
        }

        self.queue.push(action);
        debug!("{} queued {kind:?} (bypass {})", self.owner, action.bypassed);
        EnqueueOutcome::Queued {
            kind,
            bypassed: action.bypassed,
        }
    }

    /// Number of pending actions of `kind`.
    #[must_use]
    pub fn queued_count(&self, kind: ActionKind) -> usize {
        self.queue.count_of(kind)
    }

    /// Whether actions wait and no executor is running.
    #[must_use]
    pub fn needs_executor(&self) -> bool {
        self.queue.executor().is_none() && !self.queue.is_empty()
    }

    /// The running executor.
    #[must_use]
    pub fn executor(&self) -> Option<TaskId> {
        self.queue.executor()
    }

    /// Records the executor spawned for this queue.
    pub fn attach_executor(&mut self, executor: TaskId) {
        debug_assert!(self.queue.executor().is_none(), "executor already running");
        self.queue.set_executor(Some(executor));
        self.state = SequencerState::Executing;
    }

    /// Takes the next action for the executor.
    pub fn pop_next(&mut self) -> Option<QueuedAction> {
        self.queue.pop()
    }

    /// Marks `kind` as running.
    pub fn begin_executing(&mut self, kind: ActionKind) {
        self.executing = Some(kind);
    }

    /// Marks the running action as finished.
    pub fn end_executing(&mut self) {
        self.executing = None;
    }

    /// The executor found the queue empty and stopped.
    pub fn finish_executor(&mut self, now: f64) {
        self.queue.set_executor(None);
        self.executing = None;
        self.refresh(now);
    }

    /// Closes a lapsed combo window and updates the state.
    pub fn refresh(&mut self, now: f64) {
        self.queue.close_lapsed_window(now, self.config.combo_window);

        let next = if self.queue.executor().is_some() || self.executing.is_some() {
            SequencerState::Executing
        } else if self.queue.window_open(now, self.config.combo_window) || !self.queue.is_empty() {
            SequencerState::AwaitingCombo
        } else {
            SequencerState::Idle
        };
        if next != self.state {
            debug!("{} sequencer {:?} -> {next:?}", self.owner, self.state);
            self.state = next;
        }
    }

    /// Drops queued work, the window, the charge and every cooldown.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.cooldowns.reset();
        self.charge.cancel();
        self.executing = None;
        self.state = SequencerState::Idle;
    }
}
