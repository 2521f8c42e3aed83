//! Respawn timers.

use skirmish_common::{EntityId, TIME_EPSILON};
use tracing::debug;

use crate::adversary::AdversaryBrain;
use crate::scheduler::{Suspend, Task, TaskContext};
use crate::world::CombatWorld;

/// Brings a dead actor back once its respawn delay has passed.
///
/// The task has no owner: the actor it waits on is dead for its whole life.
/// If the actor is destroyed in the meantime the respawn is abandoned.
#[derive(Debug)]
pub struct RespawnTask {
    target: EntityId,
    respawn_at: f64,
}

impl RespawnTask {
    /// Respawns `target` at `respawn_at`.
    #[must_use]
    pub fn new(target: EntityId, respawn_at: f64) -> Self {
        Self { target, respawn_at }
    }
}

impl Task<CombatWorld> for RespawnTask {
    fn owner(&self) -> Option<EntityId> {
        None
    }

    fn name(&self) -> &'static str {
        "respawn"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_, CombatWorld>) -> Suspend<CombatWorld> {
        if cx.now + TIME_EPSILON < self.respawn_at {
            return Suspend::DelayFor(self.respawn_at - cx.now);
        }

        if let Err(e) = cx.world.respawn(self.target) {
            debug!("respawn abandoned: {e}");
            return Suspend::Done;
        }
        if cx.world.adversaries.contains_key(&self.target) {
            cx.spawn(Box::new(AdversaryBrain::new(self.target)));
        }
        Suspend::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::scheduler::Scheduler;
    use glam::Vec2;
    use skirmish_common::ActorKind;

    #[test]
    fn test_respawn_waits_then_restarts_brain() {
        let mut world = CombatWorld::new(CombatConfig::default());
        let boss = world.spawn_adversary(ActorKind::Boss, Vec2::ZERO);
        world.actors.get_mut(boss).expect("boss").ledger.apply_damage(1e4, 0.0);
        world.collect_deaths();
        world.on_death(boss);

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(RespawnTask::new(boss, 5.0)));
        scheduler.tick(&mut world, 0.0);
        scheduler.tick(&mut world, 4.5);
        assert!(world.actors.get(boss).is_some_and(|actor| actor.ledger.is_dead()));

        scheduler.tick(&mut world, 5.0);
        assert!(world.actors.is_alive(boss));
        assert_eq!(scheduler.task_names_for(boss), vec!["adversary-brain"]);
    }

    #[test]
    fn test_destroyed_target_is_abandoned() {
        let mut world = CombatWorld::new(CombatConfig::default());
        let player = world.spawn_player(Vec2::ZERO);
        world.destroy_actor(player);

        let mut scheduler = Scheduler::new();
        scheduler.spawn(Box::new(RespawnTask::new(player, 0.0)));
        scheduler.tick(&mut world, 0.0);
        assert!(scheduler.is_empty());
    }
}
