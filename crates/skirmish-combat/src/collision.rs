//! Overlap feed and stand-in physics.
//!
//! The physics collaborator reports zone/actor overlaps as an ordered stream
//! of [`OverlapEvent`]s and tells the core whether an actor is grounded.
//! [`OverlapTracker`] produces that stream from zone shapes and actor
//! hurtboxes for headless runs and tests.

use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, KindSet, ZoneId};
use std::collections::BTreeSet;

use crate::actor::ActorRegistry;
use crate::zone::ZoneEngine;

/// Phase of an overlap between a zone and an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverlapPhase {
    /// The actor started overlapping the zone.
    Enter,
    /// The actor is still overlapping (repeats every frame).
    Stay,
    /// The actor stopped overlapping.
    Exit,
}

/// One overlap report from physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapEvent {
    /// Zone involved.
    pub zone: ZoneId,
    /// Actor involved.
    pub target: EntityId,
    /// Overlap phase.
    pub phase: OverlapPhase,
}

impl OverlapEvent {
    /// Enter event.
    #[must_use]
    pub const fn enter(zone: ZoneId, target: EntityId) -> Self {
        Self {
            zone,
            target,
            phase: OverlapPhase::Enter,
        }
    }

    /// Stay event.
    #[must_use]
    pub const fn stay(zone: ZoneId, target: EntityId) -> Self {
        Self {
            zone,
            target,
            phase: OverlapPhase::Stay,
        }
    }

    /// Exit event.
    #[must_use]
    pub const fn exit(zone: ZoneId, target: EntityId) -> Self {
        Self {
            zone,
            target,
            phase: OverlapPhase::Exit,
        }
    }
}

/// Box-overlap stand-in for the physics collaborator.
#[derive(Debug, Clone, Default)]
pub struct OverlapTracker {
    previous: BTreeSet<(ZoneId, EntityId)>,
    ground_height: f32,
}

impl OverlapTracker {
    /// Creates a tracker with the ground at height zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ground height used for grounded reports.
    #[must_use]
    pub fn with_ground(mut self, height: f32) -> Self {
        self.ground_height = height;
        self
    }

    /// Computes this frame's overlap events, ordered by zone then actor.
    pub fn update(&mut self, zones: &ZoneEngine, actors: &ActorRegistry) -> Vec<OverlapEvent> {
        let mut current = BTreeSet::new();
        for (zone_id, zone) in zones.iter() {
            for actor in actors.iter_kinds(KindSet::ALL) {
                if zone.shape().overlaps(&actor.hurtbox()) {
                    current.insert((zone_id, actor.id));
                }
            }
        }

        let mut events: Vec<OverlapEvent> = current
            .iter()
            .map(|&(zone, target)| {
                if self.previous.contains(&(zone, target)) {
                    OverlapEvent::stay(zone, target)
                } else {
                    OverlapEvent::enter(zone, target)
                }
            })
            .chain(
                self.previous
                    .difference(&current)
                    .map(|&(zone, target)| OverlapEvent::exit(zone, target)),
            )
            .collect();
        events.sort_by_key(|event| (event.zone, event.target));

        self.previous = current;
        events
    }

    /// Reports every actor at or below ground height as grounded.
    pub fn report_grounded(&self, actors: &mut ActorRegistry) {
        for id in actors.ids() {
            if let Some(actor) = actors.get_mut(id) {
                actor.grounded = actor.position.y <= self.ground_height + 1e-3;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::config::LedgerConfig;
    use crate::ledger::StatusLedger;
    use crate::zone::DamageZone;
    use glam::Vec2;
    use skirmish_common::{Aabb, ActorKind};

    #[test]
    fn test_enter_stay_exit_sequence() {
        let mut actors = ActorRegistry::new();
        let target = actors.spawn(Actor::new(
            ActorKind::Enemy,
            Vec2::ZERO,
            Vec2::splat(0.5),
            StatusLedger::new(100.0, LedgerConfig::default()),
        ));
        let mut zones = ZoneEngine::new();
        let zone = zones.create_zone(
            DamageZone::new(Aabb::square(Vec2::ZERO, 1.0), 5.0).with_rate(1.0),
            0.0,
        );

        let mut tracker = OverlapTracker::new();
        assert_eq!(tracker.update(&zones, &actors), vec![OverlapEvent::enter(zone, target)]);
        assert_eq!(tracker.update(&zones, &actors), vec![OverlapEvent::stay(zone, target)]);

        if let Some(actor) = actors.get_mut(target) {
            actor.position = Vec2::new(10.0, 0.0);
        }
        assert_eq!(tracker.update(&zones, &actors), vec![OverlapEvent::exit(zone, target)]);
        assert!(tracker.update(&zones, &actors).is_empty());
    }

    #[test]
    fn test_grounded_report() {
        let mut actors = ActorRegistry::new();
        let mut flyer = Actor::new(
            ActorKind::Boss,
            Vec2::new(0.0, 4.0),
            Vec2::ONE,
            StatusLedger::new(100.0, LedgerConfig::default()),
        );
        flyer.grounded = true;
        let flyer = actors.spawn(flyer);

        OverlapTracker::new().report_grounded(&mut actors);
        assert_eq!(actors.get(flyer).map(|actor| actor.grounded), Some(false));
    }
}
