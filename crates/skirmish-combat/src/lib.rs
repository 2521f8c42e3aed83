//! # Skirmish Combat
//!
//! Real-time 2D action combat core.
//!
//! This crate provides:
//! - Damage zones with per-target rate limiting and hit observers
//! - Per-actor status ledgers (health, Aegis shield, timed effects, burning, regen)
//! - The player attack sequencer (combo window, charge tiers, seeker redirects, summons)
//! - The adversary state machine (target selection, attack priority, aerial passes)
//! - A cooperative task scheduler for everything timed
//! - Presentation signals, combat configuration and a frame driver

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod actor;
pub mod adversary;
pub mod collision;
pub mod config;
pub mod cooldown;
pub mod input;
pub mod ledger;
pub mod lifecycle;
pub mod projectile;
pub mod scheduler;
pub mod sequencer;
pub mod signals;
pub mod simulation;
pub mod summon;
pub mod world;
pub mod zone;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::adversary::*;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::cooldown::*;
    pub use crate::input::*;
    pub use crate::ledger::*;
    pub use crate::lifecycle::*;
    pub use crate::projectile::*;
    pub use crate::scheduler::*;
    pub use crate::sequencer::*;
    pub use crate::signals::*;
    pub use crate::simulation::*;
    pub use crate::summon::*;
    pub use crate::world::*;
    pub use crate::zone::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use skirmish_common::ActorKind;

    #[test]
    fn test_shield_absorbs_before_health() {
        let mut ledger = StatusLedger::new(50.0, LedgerConfig::default());
        ledger.apply_shield(30.0, None);

        let outcome = ledger.apply_damage(40.0, 0.0);
        assert!((ledger.shield() - 0.0).abs() < f32::EPSILON);
        assert!((ledger.health() - 40.0).abs() < f32::EPSILON);
        assert!((outcome.absorbed - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_simulation_spawns_brains_for_adversaries() {
        let mut sim = Simulation::new(CombatConfig::default());
        let boss = sim.spawn_adversary(ActorKind::Boss, Vec2::ZERO);
        assert_eq!(sim.scheduler().task_names_for(boss), vec!["adversary-brain"]);
    }
}
