//! The scripted duel.

use glam::Vec2;
use skirmish_combat::prelude::*;
use skirmish_common::{ActorKind, EntityId, KindSet};
use tracing::{debug, info};

use crate::report::EncounterReport;
use crate::script::InputScript;

/// Fixed step, 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// A player against a boss and a grunt on flat ground.
#[derive(Debug)]
pub struct Encounter {
    sim: Simulation,
    script: InputScript,
    player: EntityId,
    report: EncounterReport,
}

impl Encounter {
    /// Sets up the arena: the player at the origin, a grunt to its right and
    /// the boss further out.
    #[must_use]
    pub fn new(config: CombatConfig, script: InputScript) -> Self {
        let mut sim = Simulation::new(config).with_ground(0.0);
        let player = sim.spawn_player(Vec2::ZERO);
        let grunt = sim.spawn_adversary(ActorKind::Enemy, Vec2::new(2.5, 0.0));
        let boss = sim.spawn_adversary(ActorKind::Boss, Vec2::new(9.0, 0.0));
        info!("arena ready: player {player}, grunt {grunt}, boss {boss}");

        Self {
            sim,
            script,
            player,
            report: EncounterReport::default(),
        }
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Where the player aims: the nearest living hostile, or straight ahead.
    fn aim_point(&self) -> Vec2 {
        let actors = &self.sim.world().actors;
        let Some(origin) = actors.get(self.player).map(|actor| actor.position) else {
            return Vec2::X;
        };
        actors
            .nearest(KindSet::HOSTILES, origin, f32::INFINITY)
            .and_then(|id| actors.get(id))
            .map_or(origin + Vec2::X, |target| target.position)
    }

    /// Steps one frame.
    pub fn step(&mut self) -> StepReport {
        let now = self.sim.now();
        let frame = self.script.frame(now, self.aim_point());
        let step = self.sim.step(FIXED_DT, &[(self.player, frame)]);

        let signals = self.sim.world().signals.drain();
        for signal in &signals {
            debug!(?signal, "signal");
        }
        self.report.record_step(&step);
        self.report.record_signals(&signals);
        step
    }

    /// Runs for `seconds` of simulated time and returns the report.
    pub fn run(mut self, seconds: f64) -> EncounterReport {
        let frames = (seconds.max(0.0) / FIXED_DT).round() as u64;
        for _ in 0..frames {
            let step = self.step();
            for dead in &step.deaths {
                info!("{dead} died at {:.2}s", step.now);
            }
        }
        self.report.finish(self.sim.world());
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encounter_spawns_arena() {
        let encounter = Encounter::new(CombatConfig::default(), InputScript::duel());
        let world = encounter.simulation().world();
        assert_eq!(world.actors.len(), 3);
        assert!(world.actors.is_alive(encounter.player()));
        assert_eq!(world.adversaries.len(), 2);
    }

    #[test]
    fn test_duel_produces_hits_and_signals() {
        let encounter = Encounter::new(CombatConfig::default(), InputScript::duel());
        let report = encounter.run(6.0);

        assert_eq!(report.frames, 360);
        assert!(report.zone_hits > 0, "melee zones should connect within one loop");
        assert!(report.signals.attack_animations > 0);
        assert!(report.signals.damage_numbers > 0);
        assert!(!report.actors.is_empty());
    }

    #[test]
    fn test_zero_seconds_is_empty() {
        let encounter = Encounter::new(CombatConfig::default(), InputScript::duel());
        let report = encounter.run(0.0);
        assert_eq!(report.frames, 0);
        assert_eq!(report.actors.len(), 3);
    }
}
