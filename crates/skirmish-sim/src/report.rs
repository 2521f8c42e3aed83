//! Encounter report.
//!
//! Counts the signals an encounter published and snapshots each actor at
//! the end. Serialized to JSON by the binary.

use serde::Serialize;
use skirmish_combat::prelude::*;
use skirmish_common::{ActorKind, EntityId};

/// Signals published during an encounter, by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    /// `PlayAttackAnimation`
    pub attack_animations: u32,
    /// `SpawnVisualEffect`
    pub visual_effects: u32,
    /// `ShowDamageNumber`
    pub damage_numbers: u32,
    /// `ActorDied`
    pub deaths: u32,
    /// `ActorRespawned`
    pub respawns: u32,
}

impl SignalCounts {
    /// Counts one signal.
    pub fn record(&mut self, signal: &CombatSignal) {
        match signal {
            CombatSignal::PlayAttackAnimation { .. } => self.attack_animations += 1,
            CombatSignal::SpawnVisualEffect { .. } => self.visual_effects += 1,
            CombatSignal::ShowDamageNumber { .. } => self.damage_numbers += 1,
            CombatSignal::ActorDied { .. } => self.deaths += 1,
            CombatSignal::ActorRespawned { .. } => self.respawns += 1,
        }
    }

    /// Total signals counted.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.attack_animations + self.visual_effects + self.damage_numbers + self.deaths + self.respawns
    }
}

/// Final state of one actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSummary {
    /// Actor id
    pub id: EntityId,
    /// Actor kind
    pub kind: ActorKind,
    /// Current health
    pub health: f32,
    /// Current max health
    pub max_health: f32,
    /// Current Aegis shield
    pub shield: f32,
    /// Damage this actor took from damage numbers
    pub damage_taken: f32,
    /// Whether the actor is alive
    pub alive: bool,
}

/// Everything an encounter run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncounterReport {
    /// Simulated seconds
    pub seconds: f64,
    /// Frames stepped
    pub frames: u64,
    /// Signal counts
    pub signals: SignalCounts,
    /// Zone hits from overlaps and periodic ticks
    pub zone_hits: u64,
    /// Projectile strikes
    pub impacts: u64,
    /// Deaths processed by the driver
    pub deaths: u64,
    /// Task resumptions
    pub tasks_resumed: u64,
    /// Actors still in the world at the end, in id order
    pub actors: Vec<ActorSummary>,
    #[serde(skip)]
    damage_taken: Vec<(EntityId, f32)>,
}

impl EncounterReport {
    /// Folds one step into the totals.
    pub fn record_step(&mut self, step: &StepReport) {
        self.frames += 1;
        self.seconds = step.now;
        self.zone_hits += step.zone_hits as u64;
        self.impacts += step.impacts as u64;
        self.deaths += step.deaths.len() as u64;
        self.tasks_resumed += step.tasks_resumed as u64;
    }

    /// Folds drained signals into the counts.
    pub fn record_signals(&mut self, signals: &[CombatSignal]) {
        for signal in signals {
            self.signals.record(signal);
            if let CombatSignal::ShowDamageNumber { target, amount, .. } = signal {
                match self.damage_taken.iter_mut().find(|(id, _)| id == target) {
                    Some((_, total)) => *total += amount,
                    None => self.damage_taken.push((*target, *amount)),
                }
            }
        }
    }

    /// Snapshots every actor in the world.
    pub fn finish(&mut self, world: &CombatWorld) {
        let mut ids = world.actors.ids();
        ids.sort_unstable();
        self.actors = ids
            .into_iter()
            .filter_map(|id| world.actors.get(id))
            .map(|actor| ActorSummary {
                id: actor.id,
                kind: actor.kind,
                health: actor.ledger.health(),
                max_health: actor.ledger.max_health(),
                shield: actor.ledger.shield(),
                damage_taken: self.damage_taken_by(actor.id),
                alive: !actor.ledger.is_dead(),
            })
            .collect();
    }

    /// Damage `id` took over the encounter.
    #[must_use]
    pub fn damage_taken_by(&self, id: EntityId) -> f32 {
        self.damage_taken
            .iter()
            .find(|(entity, _)| *entity == id)
            .map_or(0.0, |(_, total)| *total)
    }
}
