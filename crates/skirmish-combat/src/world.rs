//! The combat world: every actor, zone, projectile and per-actor state machine.
//!
//! [`CombatWorld`] is the context every [`Task`](crate::scheduler::Task)
//! runs against. It does not own the scheduler; the
//! [`Simulation`](crate::simulation::Simulation) drives both and wires
//! deaths and respawns between them.

use ahash::{AHashMap, AHashSet};
use glam::Vec2;
use skirmish_common::{ActorKind, CombatError, CombatResult, EntityId, KindSet};
use tracing::{debug, info, trace};

use crate::actor::{Actor, ActorRegistry};
use crate::adversary::Adversary;
use crate::config::{AdversaryConfig, CombatConfig};
use crate::input::{InputFrame, LogicalAction};
use crate::projectile::{ProjectileStore, RedirectOutcome};
use crate::scheduler::OwnerCheck;
use crate::sequencer::{ActionKind, AttackSequencer, DropReason, EnqueueOutcome, InputOutcome};
use crate::signals::{CombatSignal, SignalBus, VisualKind};
use crate::zone::ZoneEngine;

/// Signal bus capacity.
const SIGNAL_CAPACITY: usize = 4096;

/// What happens to an actor after it dies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeathAftermath {
    /// Bring it back after this many seconds.
    Respawn(f64),
    /// Remove it for good.
    Despawn,
}

/// Counts from one world tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldTick {
    /// Periodic zone hits applied.
    pub zone_hits: usize,
    /// Projectile strikes.
    pub impacts: usize,
    /// Burning damage dealt.
    pub burn_damage: f32,
}

/// Shared combat state.
#[derive(Debug)]
pub struct CombatWorld {
    /// Current simulation time in seconds.
    pub now: f64,
    /// Tunables.
    pub config: CombatConfig,
    /// Every actor.
    pub actors: ActorRegistry,
    /// Every live damage zone.
    pub zones: ZoneEngine,
    /// Every projectile in flight.
    pub projectiles: ProjectileStore,
    /// Attack sequencers, one per player.
    pub sequencers: AHashMap<EntityId, AttackSequencer>,
    /// Encounter state, one per boss or enemy.
    pub adversaries: AHashMap<EntityId, Adversary>,
    /// Outgoing signals.
    pub signals: SignalBus,
    /// Dead actors whose death has been processed.
    handled_dead: AHashSet<EntityId>,
}

impl OwnerCheck for CombatWorld {
    fn owner_alive(&self, owner: EntityId) -> bool {
        self.actors.is_alive(owner)
    }
}

impl CombatWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: CombatConfig) -> Self {
        let signals = SignalBus::new(SIGNAL_CAPACITY, &config.visuals.available);
        Self {
            now: 0.0,
            config,
            actors: ActorRegistry::new(),
            zones: ZoneEngine::new(),
            projectiles: ProjectileStore::new(),
            sequencers: AHashMap::new(),
            adversaries: AHashMap::new(),
            signals,
            handled_dead: AHashSet::new(),
        }
    }

    /// Spawns a player with its attack sequencer.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let actor = Actor::player(position, &self.config.player, &self.config.ledger);
        let id = self.actors.spawn(actor);
        self.sequencers
            .insert(id, AttackSequencer::new(id, self.config.sequencer.clone()));
        id
    }

    /// Profile used for an adversary kind.
    #[must_use]
    pub fn profile_for(&self, kind: ActorKind) -> &AdversaryConfig {
        if kind == ActorKind::Boss {
            &self.config.boss
        } else {
            &self.config.grunt
        }
    }

    /// Spawns a boss or enemy with its encounter state. No brain is started.
    pub fn spawn_adversary(&mut self, kind: ActorKind, position: Vec2) -> EntityId {
        let profile = self.profile_for(kind).clone();
        let actor = Actor::adversary(kind, position, &profile, &self.config.ledger);
        let id = self.actors.spawn(actor);
        self.adversaries.insert(id, Adversary::new(id, kind, profile));
        id
    }

    /// Live summons fighting for `owner`.
    #[must_use]
    pub fn live_summons(&self, owner: EntityId) -> usize {
        self.actors
            .owned_by(owner, ActorKind::Summon)
            .into_iter()
            .filter(|id| self.actors.is_alive(*id))
            .count()
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Routes one input frame from `player` into its sequencer.
    pub fn handle_input(&mut self, player: EntityId, frame: &InputFrame, now: f64) -> Vec<InputOutcome> {
        let mut outcomes = Vec::new();
        let Some(actor) = self.actors.get(player).filter(|actor| !actor.ledger.is_dead()) else {
            return outcomes;
        };
        let divisor = actor.ledger.cooldown_divisor(now);
        let summons = self.live_summons(player);
        let Some(sequencer) = self.sequencers.get_mut(&player) else {
            return outcomes;
        };
        let aim = frame.aim_point;
        let modifier = frame.held(LogicalAction::ComboModifier);

        if frame.pressed(LogicalAction::PrimaryAttack) {
            if !modifier {
                outcomes.push(InputOutcome::Enqueue(sequencer.press_primary(aim, now, divisor)));
            } else if let Some(seeker) = self.projectiles.seeker_of(player) {
                let outcome =
                    self.projectiles
                        .redirect(seeker, &self.actors, self.config.projectiles.redirect_radius);
                if let RedirectOutcome::Redirected { .. } = outcome {
                    sequencer.cooldowns_mut().extend(
                        ActionKind::SeekerBolt,
                        now,
                        self.config.projectiles.redirect_extension,
                    );
                    if let Some(projectile) = self.projectiles.get(seeker) {
                        self.signals.spawn_visual(VisualKind::SeekerTrail, projectile.position);
                    }
                }
                outcomes.push(InputOutcome::Redirect(outcome));
            } else {
                outcomes.push(InputOutcome::Enqueue(sequencer.request(
                    ActionKind::SeekerBolt,
                    aim,
                    now,
                    divisor,
                )));
            }
        }

        if frame.pressed(LogicalAction::SecondaryAttack) {
            if modifier {
                let pending = sequencer.queued_count(ActionKind::SummonAlly);
                let outcome = if summons + pending >= self.config.summons.max_concurrent {
                    EnqueueOutcome::Dropped(DropReason::AtCapacity)
                } else {
                    sequencer.request(ActionKind::SummonAlly, aim, now, divisor)
                };
                outcomes.push(InputOutcome::Enqueue(outcome));
            } else {
                sequencer.begin_charge(now);
                outcomes.push(InputOutcome::ChargeStarted);
            }
        }

        if frame.released(LogicalAction::SecondaryAttack) {
            if let Some(outcome) = sequencer.release_charge(aim, now, divisor) {
                outcomes.push(InputOutcome::Enqueue(outcome));
            }
        }

        trace!("{player} input -> {outcomes:?}");
        outcomes
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances ledgers, zones, projectiles and sequencer windows to `now`.
    pub fn tick(&mut self, dt: f64, now: f64) -> WorldTick {
        self.now = now;
        let mut report = WorldTick::default();

        for id in self.actors.ids() {
            let Some(actor) = self.actors.get_mut(id) else {
                continue;
            };
            if actor.ledger.is_dead() {
                continue;
            }
            let ledger = actor.ledger.tick(now);
            if ledger.burn_damage > 0.0 {
                self.signals.damage_number(id, ledger.burn_damage, actor.position);
                report.burn_damage += ledger.burn_damage;
            }
        }

        report.zone_hits = self.zones.tick(&mut self.actors, &self.signals, now);
        report.impacts = self.projectiles.tick(&mut self.actors, &self.signals, dt, now).len();
        for sequencer in self.sequencers.values_mut() {
            sequencer.refresh(now);
        }
        report
    }

    // ========================================================================
    // Death and respawn
    // ========================================================================

    /// Actors that died since the last call, in ID order.
    pub fn collect_deaths(&mut self) -> Vec<EntityId> {
        let mut dead: Vec<EntityId> = self
            .actors
            .ids()
            .into_iter()
            .filter(|id| self.actors.get(*id).is_some_and(|actor| actor.ledger.is_dead()))
            .filter(|id| !self.handled_dead.contains(id))
            .collect();
        dead.sort_unstable();
        self.handled_dead.extend(dead.iter().copied());
        dead
    }

    /// Freezes a dead actor and cleans up what it owns.
    ///
    /// Scheduled tasks are the caller's to cancel.
    pub fn on_death(&mut self, id: EntityId) -> DeathAftermath {
        let Some(actor) = self.actors.get(id) else {
            return DeathAftermath::Despawn;
        };
        let (kind, position) = (actor.kind, actor.position);

        let zones = self.zones.destroy_owned_by(id);
        if let Some(sequencer) = self.sequencers.get_mut(&id) {
            sequencer.reset();
        }
        if let Some(adversary) = self.adversaries.get_mut(&id) {
            adversary.kill();
        }
        self.signals.publish(CombatSignal::ActorDied { entity: id });
        self.signals.spawn_visual(VisualKind::DeathPuff, position);
        info!("{kind} {id} died ({zones} zones destroyed)");

        match kind {
            ActorKind::Player => DeathAftermath::Respawn(self.config.player.respawn_delay),
            ActorKind::Boss | ActorKind::Enemy => {
                DeathAftermath::Respawn(self.profile_for(kind).respawn_delay)
            },
            ActorKind::Summon => DeathAftermath::Despawn,
        }
    }

    /// Brings a dead actor back at its spawn point with fresh state.
    pub fn respawn(&mut self, id: EntityId) -> CombatResult<()> {
        let actor = self.actors.get_mut(id).ok_or(CombatError::InvalidReference(id))?;
        actor.respawn();
        let position = actor.position;

        if let Some(adversary) = self.adversaries.get_mut(&id) {
            adversary.reset();
        }
        if let Some(sequencer) = self.sequencers.get_mut(&id) {
            sequencer.reset();
        }
        self.handled_dead.remove(&id);
        self.signals.publish(CombatSignal::ActorRespawned { entity: id });
        self.signals.spawn_visual(VisualKind::RespawnGlow, position);
        info!("{id} respawned at {position}");
        Ok(())
    }

    /// Removes an actor and everything that refers to it.
    ///
    /// Owned summons go with it. Returns every removed actor; scheduled tasks
    /// they own are the caller's to cancel.
    pub fn destroy_actor(&mut self, id: EntityId) -> Vec<EntityId> {
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if self.actors.despawn(next).is_none() {
                continue;
            }
            pending.extend(self.actors.owned_by(next, ActorKind::Summon));
            self.zones.destroy_owned_by(next);
            self.zones.forget_target(next);
            let detached = self.projectiles.detach_owner(next);
            self.sequencers.remove(&next);
            self.adversaries.remove(&next);
            self.handled_dead.remove(&next);
            debug!("destroyed {next} ({detached} projectiles detached)");
            removed.push(next);
        }
        removed
    }

    /// IDs of the actors of `kinds` that are alive.
    #[must_use]
    pub fn living(&self, kinds: KindSet) -> Vec<EntityId> {
        self.actors
            .ids_of(kinds)
            .into_iter()
            .filter(|id| self.actors.is_alive(*id))
            .collect()
    }
}
