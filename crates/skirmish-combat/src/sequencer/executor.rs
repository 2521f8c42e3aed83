//! The task that drains an attack queue.
//!
//! One [`ActionExecutor`] runs per player while its queue has work. For each
//! action it asks for the animation, waits out the windup, applies the
//! action's effect and waits out the recovery. When the queue is empty the
//! executor clears its handle on the sequencer and finishes.

use glam::Vec2;
use skirmish_common::{Aabb, EntityId, KindSet, ProjectileId, ZoneId};
use tracing::{debug, trace};

use super::action::{ActionKind, QueuedAction};
use crate::ledger::{EffectKind, ShieldGrant};
use crate::projectile::Projectile;
use crate::scheduler::{Suspend, Task, TaskContext};
use crate::signals::VisualKind;
use crate::summon::{summon_ally, SummonOutcome};
use crate::world::CombatWorld;
use crate::zone::DamageZone;

/// What performing one action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// A melee zone was created.
    Zone(ZoneId),
    /// Durability and Aegis were granted.
    Shielded(ShieldGrant),
    /// Projectiles were fired.
    Fired(Vec<ProjectileId>),
    /// A summon was requested.
    Summoned(SummonOutcome),
    /// The performer was gone or dead.
    Skipped,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Next,
    Windup(QueuedAction),
    Recovery,
}

/// Drains one player's attack queue.
#[derive(Debug)]
pub struct ActionExecutor {
    owner: EntityId,
    stage: Stage,
}

impl ActionExecutor {
    /// Creates an executor for `owner`'s queue.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            stage: Stage::Next,
        }
    }
}

impl Task<CombatWorld> for ActionExecutor {
    fn owner(&self) -> Option<EntityId> {
        Some(self.owner)
    }

    fn name(&self) -> &'static str {
        "action-executor"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        loop {
            match self.stage {
                Stage::Next => {
                    let world = &mut *cx.world;
                    let Some(sequencer) = world.sequencers.get_mut(&self.owner) else {
                        return Suspend::Done;
                    };
                    let Some(action) = sequencer.pop_next() else {
                        sequencer.finish_executor(cx.now);
                        trace!("{} queue drained", self.owner);
                        return Suspend::Done;
                    };
                    sequencer.begin_executing(action.kind);

                    let timing = action.kind.config(&world.config.sequencer);
                    let (windup, animation) = (timing.windup, timing.animation);
                    world
                        .signals
                        .play_attack(self.owner, animation, windup + timing.recovery);
                    self.stage = Stage::Windup(action);
                    return Suspend::DelayFor(windup);
                },
                Stage::Windup(action) => {
                    let effect = perform_action(cx, self.owner, &action);
                    debug!("{} performed {:?}: {effect:?}", self.owner, action.kind);
                    self.stage = Stage::Recovery;
                    let recovery = action.kind.config(&cx.world.config.sequencer).recovery;
                    return Suspend::DelayFor(recovery);
                },
                Stage::Recovery => {
                    if let Some(sequencer) = cx.world.sequencers.get_mut(&self.owner) {
                        sequencer.end_executing();
                    }
                    self.stage = Stage::Next;
                },
            }
        }
    }
}

/// Direction from `origin` toward `aim`, facing right when they coincide.
fn aim_direction(origin: Vec2, aim: Vec2) -> Vec2 {
    let direction = (aim - origin).normalize_or_zero();
    if direction == Vec2::ZERO {
        Vec2::X
    } else {
        direction
    }
}

/// Applies the effect of `action` on behalf of `owner`.
pub fn perform_action(
    cx: &mut TaskContext<'_, CombatWorld>,
    owner: EntityId,
    action: &QueuedAction,
) -> ActionEffect {
    let now = cx.now;
    let Some(actor) = cx.world.actors.get(owner).filter(|actor| !actor.ledger.is_dead()) else {
        return ActionEffect::Skipped;
    };
    let origin = actor.position;
    let multiplier = actor.ledger.outgoing_damage_multiplier(now);
    let direction = aim_direction(origin, action.aim);

    match action.kind {
        ActionKind::Slash | ActionKind::Cleave => {
            let world = &mut *cx.world;
            let config = action.kind.config(&world.config.sequencer);
            let center = origin + direction * config.reach;
            let zone = DamageZone::new(Aabb::new(center, config.zone_extents), config.damage * multiplier)
                .with_filter(KindSet::HOSTILES)
                .excludes_player(true)
                .with_duration(config.zone_duration)
                .with_owner(owner);
            let id = world.zones.create_zone(zone, now);
            let visual = if action.kind == ActionKind::Cleave {
                VisualKind::CleaveWave
            } else {
                VisualKind::SlashArc
            };
            world.signals.spawn_visual(visual, center);
            ActionEffect::Zone(id)
        },
        ActionKind::AegisSurge => {
            let world = &mut *cx.world;
            let config = &world.config.sequencer;
            let Some(actor) = world.actors.get_mut(owner) else {
                return ActionEffect::Skipped;
            };
            // Durability first so the Aegis scales from the raised maximum.
            actor.ledger.apply_effect(
                EffectKind::Durability,
                config.durability_bonus,
                config.durability_duration,
                now,
            );
            let amount = actor.ledger.max_health() * config.aegis_percent / 100.0;
            let grant = actor.ledger.apply_shield(amount, Some(config.aegis_cap_percent));
            world.signals.spawn_visual(VisualKind::AegisBurst, origin);
            ActionEffect::Shielded(grant)
        },
        ActionKind::ChargedVolley => {
            let world = &mut *cx.world;
            let config = &world.config.projectiles;
            let tier = usize::from(action.tier.clamp(1, 4)) - 1;
            let count = config.volley_counts[tier];
            let damage = config.volley_damage[tier] * multiplier;
            #[allow(clippy::cast_precision_loss)]
            let middle = count.saturating_sub(1) as f32 / 2.0;

            let mut fired = Vec::with_capacity(count as usize);
            for i in 0..count {
                #[allow(clippy::cast_precision_loss)]
                let offset = (i as f32 - middle) * config.volley_spread;
                let velocity = Vec2::from_angle(offset).rotate(direction) * config.speed;
                let projectile = Projectile::new(origin, velocity, damage)
                    .with_owner(owner)
                    .with_filter(KindSet::HOSTILES)
                    .with_lifetime(config.lifetime)
                    .with_hit_radius(config.hit_radius);
                fired.push(world.projectiles.spawn(projectile, now));
            }
            world.signals.spawn_visual(VisualKind::ChargeFlash, origin);
            ActionEffect::Fired(fired)
        },
        ActionKind::SeekerBolt => {
            let world = &mut *cx.world;
            let config = &world.config.projectiles;
            let damage = world.config.sequencer.seeker.damage * multiplier;
            let projectile = Projectile::new(origin, direction * config.speed, damage)
                .with_owner(owner)
                .with_filter(KindSet::HOSTILES)
                .with_redirect_budget(config.redirect_budget)
                .with_lifetime(config.lifetime)
                .with_hit_radius(config.hit_radius);
            let id = world.projectiles.spawn(projectile, now);
            ActionEffect::Fired(vec![id])
        },
        ActionKind::SummonAlly => ActionEffect::Summoned(summon_ally(cx, owner)),
    }
}
