//! Allied summons.
//!
//! A summon is an ordinary [`Actor`] of kind `Summon` with an owner. Its
//! behaviour runs as a [`SummonTask`]: walk toward the nearest hostile in
//! range, strike it on an interval, and vanish when the lifetime runs out.
//! Summons never respawn.

use glam::Vec2;
use skirmish_common::{Aabb, EntityId, KindSet};
use tracing::{debug, info};

use crate::actor::Actor;
use crate::scheduler::{Suspend, Task, TaskContext};
use crate::signals::VisualKind;
use crate::world::CombatWorld;
use crate::zone::DamageZone;

/// Slack on the strike range so a summon parked at the edge still strikes.
const STRIKE_TOLERANCE: f32 = 1e-3;

/// Result of a summon request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonOutcome {
    /// A summon was created.
    Summoned(EntityId),
    /// The owner already has the maximum number of live summons.
    AtCapacity,
    /// The owner is gone or dead.
    OwnerGone,
}

/// Creates a summon for `owner` and starts its behaviour task.
pub fn summon_ally(cx: &mut TaskContext<'_, CombatWorld>, owner: EntityId) -> SummonOutcome {
    let now = cx.now;
    let world = &mut *cx.world;
    let Some(position) = world
        .actors
        .get(owner)
        .filter(|actor| !actor.ledger.is_dead())
        .map(|actor| actor.position)
    else {
        return SummonOutcome::OwnerGone;
    };

    let config = &world.config.summons;
    if world.live_summons(owner) >= config.max_concurrent {
        debug!("{owner} summon refused: {} live", config.max_concurrent);
        return SummonOutcome::AtCapacity;
    }

    let spawn_at = position + config.offset;
    let summon = Actor::summon(owner, spawn_at, config, &world.config.ledger);
    let lifetime = config.lifetime;
    let id = world.actors.spawn(summon);
    world.signals.spawn_visual(VisualKind::SummonPortal, spawn_at);
    info!("{owner} summoned {id} for {lifetime}s");

    cx.spawn(Box::new(SummonTask::new(id, now + lifetime)));
    SummonOutcome::Summoned(id)
}

/// Behaviour of one summon.
#[derive(Debug)]
pub struct SummonTask {
    summon: EntityId,
    expires_at: f64,
    last_step: Option<f64>,
    next_strike_at: f64,
}

impl SummonTask {
    /// Drives `summon` until `expires_at`.
    #[must_use]
    pub fn new(summon: EntityId, expires_at: f64) -> Self {
        Self {
            summon,
            expires_at,
            last_step: None,
            next_strike_at: 0.0,
        }
    }
}

impl Task<CombatWorld> for SummonTask {
    fn owner(&self) -> Option<EntityId> {
        Some(self.summon)
    }

    fn name(&self) -> &'static str {
        "summon"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        let now = cx.now;
        let world = &mut *cx.world;
        if now + skirmish_common::TIME_EPSILON >= self.expires_at {
            debug!("{} lifetime over", self.summon);
            world.destroy_actor(self.summon);
            return Suspend::Done;
        }

        let dt = self.last_step.map_or(0.0, |last| now - last);
        self.last_step = Some(now);

        let config = &world.config.summons;
        let Some(summon) = world.actors.get(self.summon) else {
            return Suspend::Done;
        };
        let from = summon.position;
        let speed = config.move_speed * summon.ledger.speed_multiplier(now);
        let multiplier = summon.ledger.outgoing_damage_multiplier(now);
        let Some(target) = world
            .actors
            .nearest(KindSet::HOSTILES, from, config.detection_radius)
            .and_then(|id| world.actors.get(id))
            .map(|actor| actor.position)
        else {
            return Suspend::NextTick;
        };

        let offset = target - from;
        if offset.length() > config.strike_range + STRIKE_TOLERANCE {
            #[allow(clippy::cast_possible_truncation)]
            let step = (speed * dt as f32).min(offset.length() - config.strike_range);
            if let Some(summon) = world.actors.get_mut(self.summon) {
                summon.position += offset.normalize_or_zero() * step;
            }
            return Suspend::NextTick;
        }

        if now + skirmish_common::TIME_EPSILON >= self.next_strike_at {
            let zone = DamageZone::new(
                Aabb::new(target, Vec2::splat(0.3)),
                config.strike_damage * multiplier,
            )
            .with_filter(KindSet::HOSTILES)
            .excludes_player(true)
            .with_duration(0.1)
            .with_owner(self.summon);
            world.zones.create_zone(zone, now);
            self.next_strike_at = now + config.strike_interval;
        }
        Suspend::NextTick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::scheduler::Scheduler;
    use skirmish_common::{ActorKind, TaskId};

    #[test]
    fn test_capacity_is_enforced() {
        let mut world = CombatWorld::new(CombatConfig::default());
        let player = world.spawn_player(Vec2::ZERO);
        let mut spawned = Vec::new();
        let mut next_id = TaskId::from_raw(1);
        let mut cx = TaskContext::for_tests(&mut world, 0.0, &mut next_id, &mut spawned);

        assert!(matches!(summon_ally(&mut cx, player), SummonOutcome::Summoned(_)));
        assert!(matches!(summon_ally(&mut cx, player), SummonOutcome::Summoned(_)));
        assert_eq!(summon_ally(&mut cx, player), SummonOutcome::AtCapacity);
        assert_eq!(spawned.len(), 2);
        assert_eq!(world.live_summons(player), 2);
    }

    #[test]
    fn test_summon_vanishes_after_lifetime() {
        let mut config = CombatConfig::default();
        config.summons.lifetime = 1.0;
        let mut world = CombatWorld::new(config);
        let player = world.spawn_player(Vec2::ZERO);

        let mut scheduler = Scheduler::new();
        let summon = world.actors.spawn(Actor::summon(
            player,
            Vec2::new(1.5, 0.0),
            &world.config.summons,
            &world.config.ledger,
        ));
        scheduler.spawn(Box::new(SummonTask::new(summon, 1.0)));

        scheduler.tick(&mut world, 0.5);
        assert!(world.actors.contains(summon));
        scheduler.tick(&mut world, 1.0);
        assert!(!world.actors.contains(summon));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_summon_walks_to_and_strikes_hostile() {
        let mut world = CombatWorld::new(CombatConfig::default());
        let player = world.spawn_player(Vec2::ZERO);
        world.spawn_adversary(ActorKind::Enemy, Vec2::new(5.0, 0.0));
        let summon = world.actors.spawn(Actor::summon(
            player,
            Vec2::new(1.5, 0.0),
            &world.config.summons,
            &world.config.ledger,
        ));

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(SummonTask::new(summon, 100.0)));
        let mut now = 0.0;
        while now <= 2.0 {
            scheduler.tick(&mut world, now);
            now += 0.125;
        }

        let position = world.actors.get(summon).map(|actor| actor.position);
        // Stops at strike range from the enemy.
        assert!(position.is_some_and(|p| (p.x - 3.8).abs() < 1e-3));
        assert!(!world.zones.is_empty());
    }
}
