//! Adversary behaviour tasks.

use glam::Vec2;
use skirmish_common::{Aabb, EntityId, KindSet, TIME_EPSILON};
use tracing::{debug, warn};

use super::{AdversaryPhase, AerialStage, AttackChoice, Decision};
use crate::config::AttackBand;
use crate::ledger::EffectKind;
use crate::projectile::Projectile;
use crate::scheduler::{Suspend, Task, TaskContext};
use crate::signals::VisualKind;
use crate::world::CombatWorld;
use crate::zone::DamageZone;

/// Seconds a melee or burst zone stays live.
const STRIKE_ZONE_DURATION: f64 = 0.2;

/// Moves `id` to `next`, logging a refused transition instead of failing.
fn enter_phase(world: &mut CombatWorld, id: EntityId, next: AdversaryPhase) {
    if let Some(adversary) = world.adversaries.get_mut(&id) {
        if let Err(e) = adversary.transition(next) {
            warn!("{id}: {e}");
        }
    }
}

/// Hands control back to the brain.
fn finish_attack(world: &mut CombatWorld, id: EntityId) {
    enter_phase(world, id, AdversaryPhase::Idle);
    if let Some(adversary) = world.adversaries.get_mut(&id) {
        adversary.set_attack_task(None);
    }
}

/// Position of the adversary's current target, if it is still alive.
fn target_position(world: &CombatWorld, id: EntityId) -> Option<Vec2> {
    let target = world.adversaries.get(&id)?.target()?;
    world
        .actors
        .get(target)
        .filter(|actor| !actor.ledger.is_dead())
        .map(|actor| actor.position)
}

// ============================================================================
// Brain
// ============================================================================

/// Per-tick decision loop of one adversary.
#[derive(Debug)]
pub struct AdversaryBrain {
    id: EntityId,
    last_step: Option<f64>,
}

impl AdversaryBrain {
    /// Creates the brain of `id`.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self { id, last_step: None }
    }
}

/// Latches health thresholds and enrages once per newly engaged latch.
fn latch_thresholds(world: &mut CombatWorld, id: EntityId, now: f64) {
    let Some(fraction) = world.actors.get(id).map(|actor| actor.ledger.health_fraction()) else {
        return;
    };
    let Some(adversary) = world.adversaries.get_mut(&id) else {
        return;
    };
    let before = adversary.pass_count();
    if !adversary.update_latches(fraction) {
        return;
    }
    let engaged = adversary.pass_count() - before;
    let profile = adversary.profile();
    let (strength, duration) = (profile.enrage_strength, profile.enrage_duration);
    if let Some(actor) = world.actors.get_mut(id) {
        for _ in 0..engaged {
            actor.ledger.apply_effect(EffectKind::Strength, strength, duration, now);
        }
    }
}

impl Task<CombatWorld> for AdversaryBrain {
    fn owner(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn name(&self) -> &'static str {
        "adversary-brain"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        let now = cx.now;
        let id = self.id;
        let world = &mut *cx.world;
        latch_thresholds(world, id, now);
        let Some(actor) = world.actors.get(id) else {
            return Suspend::Done;
        };
        let Some(adversary) = world.adversaries.get_mut(&id) else {
            return Suspend::Done;
        };
        let position = actor.position;
        let speed = adversary.profile().move_speed * actor.ledger.speed_multiplier(now);

        let target = world
            .actors
            .nearest(KindSet::ALLIES, position, adversary.profile().detection_radius)
            .and_then(|target| world.actors.get(target))
            .map(|target| (target.id, target.position));
        adversary.set_target(target.map(|(target, _)| target));

        let dt = self.last_step.map_or(0.0, |last| now - last);
        self.last_step = Some(now);

        let decision = adversary.decide(
            target.map(|(target, at)| (target, at.distance(position))),
            now,
        );
        match decision {
            Decision::Attack(choice) => {
                adversary.start_cooldown(choice, now);
                let phase = match choice {
                    AttackChoice::Aerial => AdversaryPhase::Aerial(AerialStage::Rising),
                    AttackChoice::Ranged => AdversaryPhase::Ranged,
                    AttackChoice::Melee => AdversaryPhase::Melee,
                };
                let task: Box<dyn Task<CombatWorld>> = match choice {
                    AttackChoice::Aerial => Box::new(AerialAttack::new(id)),
                    AttackChoice::Ranged => Box::new(RangedAttack::new(id)),
                    AttackChoice::Melee => Box::new(MeleeAttack::new(id)),
                };
                if let Err(e) = adversary.transition(phase) {
                    warn!("{id}: {e}");
                    return Suspend::NextTick;
                }
                let task = cx.spawn(task);
                if let Some(adversary) = cx.world.adversaries.get_mut(&id) {
                    adversary.set_attack_task(Some(task));
                }

                // Resume once the attack hands control back.
                self.last_step = None;
                Suspend::WaitUntil(Box::new(move |world: &CombatWorld| {
                    world
                        .adversaries
                        .get(&id)
                        .map_or(true, |adversary| adversary.attack_task().is_none())
                }))
            },
            Decision::MoveToward(_) => {
                let reach = adversary.band(AttackChoice::Melee).max_range;
                if let Err(e) = adversary.transition(AdversaryPhase::Chasing) {
                    warn!("{id}: {e}");
                }
                if let (Some((_, at)), Some(actor)) = (target, world.actors.get_mut(id)) {
                    // Horizontal chase; stop just inside melee reach.
                    let dx = at.x - position.x;
                    #[allow(clippy::cast_possible_truncation)]
                    let step = (speed * dt as f32).min((dx.abs() - reach * 0.9).max(0.0));
                    actor.position.x += step * dx.signum();
                }
                Suspend::NextTick
            },
            Decision::Idle => {
                if let Err(e) = adversary.transition(AdversaryPhase::Idle) {
                    warn!("{id}: {e}");
                }
                Suspend::NextTick
            },
        }
    }
}

// ============================================================================
// Ground attacks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroundStage {
    Start,
    Strike,
    Recover,
}

fn ground_band(world: &CombatWorld, id: EntityId, choice: AttackChoice) -> Option<AttackBand> {
    world
        .adversaries
        .get(&id)
        .map(|adversary| adversary.band(choice).clone())
}

/// Close-range strike in front of the adversary.
#[derive(Debug)]
pub struct MeleeAttack {
    id: EntityId,
    stage: GroundStage,
}

impl MeleeAttack {
    /// Creates the attack for `id`.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            stage: GroundStage::Start,
        }
    }
}

impl Task<CombatWorld> for MeleeAttack {
    fn owner(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn name(&self) -> &'static str {
        "melee-attack"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        let id = self.id;
        let Some(band) = ground_band(cx.world, id, AttackChoice::Melee) else {
            return Suspend::Done;
        };
        match self.stage {
            GroundStage::Start => {
                cx.world
                    .signals
                    .play_attack(id, band.animation, band.windup + band.recovery);
                self.stage = GroundStage::Strike;
                Suspend::DelayFor(band.windup)
            },
            GroundStage::Strike => {
                let world = &mut *cx.world;
                if let Some(actor) = world.actors.get(id) {
                    let facing = target_position(world, id)
                        .map_or(1.0, |at| if at.x < actor.position.x { -1.0 } else { 1.0 });
                    let half_reach = band.max_range / 2.0;
                    let center = actor.position + Vec2::new(facing * half_reach, 0.0);
                    let damage = band.damage * actor.ledger.outgoing_damage_multiplier(cx.now);
                    let zone = DamageZone::new(
                        Aabb::new(center, Vec2::new(half_reach, actor.half_extents.y)),
                        damage,
                    )
                    .with_filter(KindSet::ALLIES)
                    .with_duration(STRIKE_ZONE_DURATION)
                    .with_owner(id);
                    world.zones.create_zone(zone, cx.now);
                }
                self.stage = GroundStage::Recover;
                Suspend::DelayFor(band.recovery)
            },
            GroundStage::Recover => {
                finish_attack(cx.world, id);
                Suspend::Done
            },
        }
    }
}

/// Hostile projectile fired at the target.
#[derive(Debug)]
pub struct RangedAttack {
    id: EntityId,
    stage: GroundStage,
}

impl RangedAttack {
    /// Creates the attack for `id`.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            stage: GroundStage::Start,
        }
    }
}

impl Task<CombatWorld> for RangedAttack {
    fn owner(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn name(&self) -> &'static str {
        "ranged-attack"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        let id = self.id;
        let Some(band) = ground_band(cx.world, id, AttackChoice::Ranged) else {
            return Suspend::Done;
        };
        match self.stage {
            GroundStage::Start => {
                cx.world
                    .signals
                    .play_attack(id, band.animation, band.windup + band.recovery);
                self.stage = GroundStage::Strike;
                Suspend::DelayFor(band.windup)
            },
            GroundStage::Strike => {
                let target = target_position(cx.world, id);
                let world = &mut *cx.world;
                match (world.actors.get(id), target) {
                    (Some(actor), Some(at)) => {
                        let config = &world.config.projectiles;
                        let direction = (at - actor.position).normalize_or_zero();
                        let damage = band.damage * actor.ledger.outgoing_damage_multiplier(cx.now);
                        let projectile = Projectile::new(actor.position, direction * config.speed, damage)
                            .with_owner(id)
                            .with_filter(KindSet::ALLIES)
                            .with_lifetime(config.lifetime)
                            .with_hit_radius(config.hit_radius);
                        world.projectiles.spawn(projectile, cx.now);
                    },
                    _ => debug!("{id} ranged attack lost its target"),
                }
                self.stage = GroundStage::Recover;
                Suspend::DelayFor(band.recovery)
            },
            GroundStage::Recover => {
                finish_attack(cx.world, id);
                Suspend::Done
            },
        }
    }
}

// ============================================================================
// Aerial attack
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum AerialStep {
    Rise,
    Relocate,
    Pass,
    Land,
    Recover,
}

/// Rise, pass over the target one or more times, land.
///
/// After an even number of passes the adversary is back on the side it rose
/// from and lands at its rising position; after an odd number it lands where
/// the last pass ended.
#[derive(Debug)]
pub struct AerialAttack {
    id: EntityId,
    step: AerialStep,
    origin: Vec2,
    passes: u32,
    pass: u32,
    /// Horizontal travel direction of the current pass.
    heading: f32,
    pass_end_x: f32,
    target_x: f32,
    burst_fired: bool,
    last_step: f64,
}

impl AerialAttack {
    /// Creates the attack for `id`.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            step: AerialStep::Rise,
            origin: Vec2::ZERO,
            passes: 1,
            pass: 0,
            heading: 1.0,
            pass_end_x: 0.0,
            target_x: 0.0,
            burst_fired: false,
            last_step: 0.0,
        }
    }

    fn start_pass(&mut self, world: &mut CombatWorld, pass: u32, offset: f32) {
        enter_phase(world, self.id, AdversaryPhase::Aerial(AerialStage::Passing { pass }));
        self.pass = pass;
        self.burst_fired = false;
        self.pass_end_x = self.target_x + self.heading * offset;
    }
}

impl Task<CombatWorld> for AerialAttack {
    fn owner(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn name(&self) -> &'static str {
        "aerial-attack"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        let id = self.id;
        let now = cx.now;
        let world = &mut *cx.world;
        let Some(aerial) = world.adversaries.get(&id).map(|adversary| adversary.profile().aerial.clone())
        else {
            return Suspend::Done;
        };
        let passes = world.adversaries.get(&id).map_or(1, super::Adversary::pass_count);
        let tracked = target_position(world, id);
        let Some(actor) = world.actors.get_mut(id) else {
            return Suspend::Done;
        };

        match self.step {
            AerialStep::Rise => {
                self.origin = actor.position;
                self.passes = passes;
                self.target_x = tracked.map_or(actor.position.x, |at| at.x);
                actor.grounded = false;
                let total = aerial.rise_duration + aerial.band.recovery;
                world.signals.play_attack(id, aerial.band.animation, total);
                debug!("{id} rising for {} passes", self.passes);
                self.step = AerialStep::Relocate;
                Suspend::DelayFor(aerial.rise_duration)
            },
            AerialStep::Relocate => {
                if let Some(at) = tracked {
                    self.target_x = at.x;
                }
                // Start on the side we rose from and fly across.
                let side = if self.origin.x <= self.target_x { -1.0 } else { 1.0 };
                actor.position = Vec2::new(
                    self.target_x + side * aerial.pass_offset,
                    self.origin.y + aerial.rise_height,
                );
                self.heading = -side;
                self.last_step = now;
                self.step = AerialStep::Pass;
                self.start_pass(world, 1, aerial.pass_offset);
                Suspend::NextTick
            },
            AerialStep::Pass => {
                #[allow(clippy::cast_possible_truncation)]
                let travel = aerial.pass_speed * (now - self.last_step) as f32;
                self.last_step = now;
                let remaining = (self.pass_end_x - actor.position.x) * self.heading;
                actor.position.x += self.heading * travel.min(remaining.max(0.0));
                let x = actor.position.x;
                let multiplier = actor.ledger.outgoing_damage_multiplier(now);

                if !self.burst_fired {
                    if let Some(at) = tracked.filter(|at| (at.x - x).abs() <= aerial.burst_band) {
                        let center = Vec2::new(x, at.y);
                        let zone = DamageZone::new(
                            Aabb::new(center, aerial.burst_extents),
                            aerial.band.damage * multiplier,
                        )
                        .with_filter(KindSet::ALLIES)
                        .with_duration(STRIKE_ZONE_DURATION)
                        .with_burning(aerial.burn_per_tick, aerial.burn_duration)
                        .with_owner(id);
                        world.zones.create_zone(zone, now);
                        world.signals.spawn_visual(VisualKind::AerialBurst, center);
                        self.burst_fired = true;
                        debug!("{id} burst on pass {}", self.pass);
                    }
                }

                if remaining - travel > TIME_EPSILON as f32 {
                    return Suspend::NextTick;
                }
                if self.pass < self.passes {
                    if let Some(at) = tracked {
                        self.target_x = at.x;
                    }
                    self.heading = -self.heading;
                    self.start_pass(world, self.pass + 1, aerial.pass_offset);
                    return Suspend::NextTick;
                }

                enter_phase(world, id, AdversaryPhase::Aerial(AerialStage::Landing));
                self.step = AerialStep::Land;
                Suspend::NextTick
            },
            AerialStep::Land => {
                let land_x = if self.passes % 2 == 0 { self.origin.x } else { actor.position.x };
                actor.position = Vec2::new(land_x, self.origin.y);
                let deadline = now + aerial.landing_timeout;
                self.step = AerialStep::Recover;
                Suspend::WaitUntil(Box::new(move |world: &CombatWorld| {
                    world.actors.get(id).map_or(true, |actor| actor.grounded)
                        || world.now + TIME_EPSILON >= deadline
                }))
            },
            AerialStep::Recover => {
                actor.grounded = true;
                finish_attack(world, id);
                Suspend::Done
            },
        }
    }
}
