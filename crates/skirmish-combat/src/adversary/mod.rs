//! Adversary state machine.
//!
//! Bosses and grunts share one machine. Every tick the brain task:
//! - re-selects the nearest player or summon in detection range
//! - latches health-threshold passives that add aerial passes
//! - picks the first eligible option in the fixed order
//!   Aerial > Ranged > Melee > Move toward target > Idle
//!
//! Each attack runs as its own task and hands control back to the brain when
//! it finishes. The current [`AdversaryPhase`] is the only behavioural state;
//! every change goes through the transition table.

mod phase;
mod tasks;

pub use phase::{AdversaryPhase, AerialStage};
pub use tasks::{AdversaryBrain, AerialAttack, MeleeAttack, RangedAttack};

use serde::{Deserialize, Serialize};
use skirmish_common::{ActorKind, CombatResult, EntityId, TaskId};
use tracing::{debug, info};

use crate::config::{AdversaryConfig, AttackBand};
use crate::cooldown::CooldownBook;

/// The three adversary attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackChoice {
    /// Multi-phase aerial attack.
    Aerial,
    /// Projectile attack.
    Ranged,
    /// Close-range attack.
    Melee,
}

/// Result of one decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start an attack.
    Attack(AttackChoice),
    /// Walk toward the target.
    MoveToward(EntityId),
    /// Nothing to do.
    Idle,
}

/// Encounter state of one boss or enemy.
#[derive(Debug, Clone)]
pub struct Adversary {
    id: EntityId,
    kind: ActorKind,
    profile: AdversaryConfig,
    phase: AdversaryPhase,
    cooldowns: CooldownBook<AttackChoice>,
    /// Latched passives for the first and second health thresholds.
    latches: [bool; 2],
    target: Option<EntityId>,
    attack_task: Option<TaskId>,
}

impl Adversary {
    /// Creates an idle adversary with every attack ready.
    #[must_use]
    pub fn new(id: EntityId, kind: ActorKind, profile: AdversaryConfig) -> Self {
        Self {
            id,
            kind,
            profile,
            phase: AdversaryPhase::Idle,
            cooldowns: CooldownBook::new(),
            latches: [false; 2],
            target: None,
            attack_task: None,
        }
    }

    /// Actor this state belongs to.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Boss or enemy.
    #[must_use]
    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Tunables.
    #[must_use]
    pub fn profile(&self) -> &AdversaryConfig {
        &self.profile
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AdversaryPhase {
        self.phase
    }

    /// Moves to `next` if the transition table allows it.
    pub fn transition(&mut self, next: AdversaryPhase) -> CombatResult<()> {
        if self.phase == next {
            return Ok(());
        }
        self.phase.check_transition(next)?;
        debug!("{} {} -> {}", self.id, self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Target chosen on the last decision step.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Records the current target.
    pub fn set_target(&mut self, target: Option<EntityId>) {
        if target != self.target {
            debug!("{} target {:?} -> {target:?}", self.id, self.target);
            self.target = target;
        }
    }

    /// Running attack task, if any.
    #[must_use]
    pub fn attack_task(&self) -> Option<TaskId> {
        self.attack_task
    }

    /// Records the running attack task.
    pub fn set_attack_task(&mut self, task: Option<TaskId>) {
        self.attack_task = task;
    }

    /// Aerial passes per attack: the base count plus one per latched threshold.
    #[must_use]
    pub fn pass_count(&self) -> u32 {
        let latched = self.latches.iter().filter(|latched| **latched).count();
        #[allow(clippy::cast_possible_truncation)]
        let latched = latched as u32;
        self.profile.aerial.base_passes + latched
    }

    /// Latches any threshold `health_fraction` has reached.
    /// Returns true if a new latch engaged.
    pub fn update_latches(&mut self, health_fraction: f32) -> bool {
        let thresholds = [self.profile.first_threshold, self.profile.second_threshold];
        let mut engaged = false;
        for (latch, threshold) in self.latches.iter_mut().zip(thresholds) {
            if !*latch && health_fraction <= threshold {
                *latch = true;
                engaged = true;
            }
        }
        if engaged {
            info!("{} enraged: {} aerial passes", self.id, self.pass_count());
        }
        engaged
    }

    /// Range band and timing of an attack.
    #[must_use]
    pub fn band(&self, choice: AttackChoice) -> &AttackBand {
        match choice {
            AttackChoice::Aerial => &self.profile.aerial.band,
            AttackChoice::Ranged => &self.profile.ranged,
            AttackChoice::Melee => &self.profile.melee,
        }
    }

    /// Whether `choice` is off cooldown at `now`.
    #[must_use]
    pub fn is_ready(&self, choice: AttackChoice, now: f64) -> bool {
        self.cooldowns.is_ready(choice, now)
    }

    /// Starts the cooldown of `choice`.
    pub fn start_cooldown(&mut self, choice: AttackChoice, now: f64) {
        let cooldown = self.band(choice).cooldown;
        self.cooldowns.start(choice, now, cooldown);
    }

    /// Picks the first eligible option for a target at `distance`.
    #[must_use]
    pub fn decide(&self, target: Option<(EntityId, f32)>, now: f64) -> Decision {
        let Some((target, distance)) = target else {
            return Decision::Idle;
        };

        let eligible = |choice: AttackChoice| {
            self.band(choice).in_range(distance) && self.is_ready(choice, now)
        };
        if self.profile.aerial.enabled && eligible(AttackChoice::Aerial) {
            return Decision::Attack(AttackChoice::Aerial);
        }
        for choice in [AttackChoice::Ranged, AttackChoice::Melee] {
            if eligible(choice) {
                return Decision::Attack(choice);
            }
        }
        Decision::MoveToward(target)
    }

    /// Marks the adversary dead. Always legal.
    pub fn kill(&mut self) {
        debug!("{} {} -> {}", self.id, self.phase, AdversaryPhase::Dead);
        self.phase = AdversaryPhase::Dead;
        self.attack_task = None;
        self.target = None;
    }

    /// Back to spawn state: idle, no latches, every attack ready.
    pub fn reset(&mut self) {
        self.phase = AdversaryPhase::Idle;
        self.cooldowns.reset();
        self.latches = [false; 2];
        self.target = None;
        self.attack_task = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss() -> Adversary {
        Adversary::new(EntityId::new(), ActorKind::Boss, AdversaryConfig::boss())
    }

    #[test]
    fn test_pass_count_latches() {
        let mut boss = boss();
        assert_eq!(boss.pass_count(), 1);

        assert!(boss.update_latches(0.5));
        assert_eq!(boss.pass_count(), 2);

        // Healing back above the threshold does not revert the latch.
        assert!(!boss.update_latches(0.9));
        assert_eq!(boss.pass_count(), 2);

        assert!(boss.update_latches(0.25));
        assert_eq!(boss.pass_count(), 3);

        boss.reset();
        assert_eq!(boss.pass_count(), 1);
    }

    #[test]
    fn test_both_latches_in_one_step() {
        let mut boss = boss();
        boss.update_latches(0.1);
        assert_eq!(boss.pass_count(), 3);
    }

    #[test]
    fn test_decision_priority() {
        let mut boss = boss();
        let target = EntityId::new();

        // 5 units: aerial (3..12) beats ranged (4..10).
        assert_eq!(
            boss.decide(Some((target, 5.0)), 0.0),
            Decision::Attack(AttackChoice::Aerial)
        );
        boss.start_cooldown(AttackChoice::Aerial, 0.0);
        assert_eq!(
            boss.decide(Some((target, 5.0)), 0.0),
            Decision::Attack(AttackChoice::Ranged)
        );
        assert_eq!(
            boss.decide(Some((target, 1.0)), 0.0),
            Decision::Attack(AttackChoice::Melee)
        );
        boss.start_cooldown(AttackChoice::Melee, 0.0);
        assert_eq!(boss.decide(Some((target, 1.0)), 0.0), Decision::MoveToward(target));
        assert_eq!(boss.decide(None, 0.0), Decision::Idle);

        // Cooldowns lapse.
        assert_eq!(
            boss.decide(Some((target, 1.0)), 1.5),
            Decision::Attack(AttackChoice::Melee)
        );
    }

    #[test]
    fn test_grunt_never_goes_aerial() {
        let grunt = Adversary::new(EntityId::new(), ActorKind::Enemy, AdversaryConfig::grunt());
        assert_eq!(
            grunt.decide(Some((EntityId::new(), 5.0)), 0.0),
            Decision::Attack(AttackChoice::Ranged)
        );
    }

    #[test]
    fn test_transitions_follow_table() {
        let mut boss = boss();
        assert!(boss.transition(AdversaryPhase::Melee).is_ok());
        assert!(boss.transition(AdversaryPhase::Ranged).is_err());
        assert_eq!(boss.phase(), AdversaryPhase::Melee);

        boss.kill();
        assert_eq!(boss.phase(), AdversaryPhase::Dead);
        assert!(boss.transition(AdversaryPhase::Chasing).is_err());

        boss.reset();
        assert_eq!(boss.phase(), AdversaryPhase::Idle);
        assert!(boss.is_ready(AttackChoice::Aerial, 0.0));
    }
}
