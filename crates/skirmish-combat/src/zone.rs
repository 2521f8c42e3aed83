//! Damage zone engine.
//!
//! A [`DamageZone`] is a transient box that deals rate-limited damage to the
//! actors overlapping it. Zones are configured through builder methods and
//! handed to the [`ZoneEngine`], which:
//! - filters candidates (exclusion mask first, then target filter)
//! - hits immediately on enter and then every `rate` seconds while inside
//! - stops hitting the moment an actor exits
//! - rate-limits each zone/target pair on its own
//! - runs the zone's observers once per successful hit
//! - removes zones whose duration has run out

use ahash::AHashMap;
use glam::Vec2;
use skirmish_common::{
    Aabb, ActorKind, CombatError, CombatResult, EntityId, KindSet, ZoneId, TIME_EPSILON,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

use crate::actor::{Actor, ActorRegistry, Combatant};
use crate::collision::{OverlapEvent, OverlapPhase};
use crate::ledger::DamageOutcome;
use crate::signals::SignalBus;

/// A successful zone hit, passed to observers.
#[derive(Debug)]
pub struct ZoneHit<'a> {
    /// Zone that hit.
    pub zone: ZoneId,
    /// Actor that was hit.
    pub target: &'a Actor,
    /// What the hit did.
    pub outcome: DamageOutcome,
    /// Simulation time of the hit.
    pub at: f64,
}

/// Callback run on every successful hit of one zone.
pub type ZoneObserver = Box<dyn FnMut(&ZoneHit<'_>)>;

/// A transient damage region.
pub struct DamageZone {
    shape: Aabb,
    damage: f32,
    rate: f64,
    filter: KindSet,
    exclude: KindSet,
    duration: f64,
    owner: Option<EntityId>,
    expires_at: Option<f64>,
    /// Burning (damage per tick, seconds) set on every actor hit.
    ignite: Option<(f32, f64)>,
    /// Actors inside, with the time of the last hit on each.
    inside: AHashMap<EntityId, f64>,
    observers: Vec<ZoneObserver>,
}

impl fmt::Debug for DamageZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DamageZone")
            .field("shape", &self.shape)
            .field("damage", &self.damage)
            .field("rate", &self.rate)
            .field("filter", &self.filter)
            .field("exclude", &self.exclude)
            .field("owner", &self.owner)
            .field("expires_at", &self.expires_at)
            .field("ignite", &self.ignite)
            .field("inside", &self.inside.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl DamageZone {
    /// A zone hitting every kind once per enter, living until destroyed.
    #[must_use]
    pub fn new(shape: Aabb, damage: f32) -> Self {
        Self {
            shape,
            damage: damage.max(0.0),
            rate: 0.0,
            filter: KindSet::ALL,
            exclude: KindSet::NONE,
            duration: 0.0,
            owner: None,
            expires_at: None,
            ignite: None,
            inside: AHashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Set the seconds between hits on an actor that stays inside.
    /// Zero or less means one hit per enter.
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the kinds this zone may damage.
    #[must_use]
    pub fn with_filter(mut self, filter: KindSet) -> Self {
        self.filter = filter;
        self
    }

    /// Set the kinds this zone never affects.
    #[must_use]
    pub fn with_exclusions(mut self, exclude: KindSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set the lifetime in seconds. Zero or less means the owner destroys it.
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the owning actor. A zone never damages its owner.
    #[must_use]
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set every actor this zone hits burning.
    #[must_use]
    pub fn with_burning(mut self, damage_per_tick: f32, duration: f64) -> Self {
        self.ignite =
            (damage_per_tick > 0.0 && duration > 0.0).then_some((damage_per_tick, duration));
        self
    }

    /// Never affect the player.
    #[must_use]
    pub fn excludes_player(mut self, excluded: bool) -> Self {
        self.exclude = if excluded {
            self.exclude.with(ActorKind::Player)
        } else {
            self.exclude.without(ActorKind::Player)
        };
        self
    }

    /// Whether enemies (bosses included) are valid targets.
    #[must_use]
    pub fn can_damage_enemies(mut self, allowed: bool) -> Self {
        self.filter = if allowed {
            self.filter.with(ActorKind::Enemy)
        } else {
            self.filter.without(ActorKind::Enemy)
        };
        self
    }

    /// Whether summons are valid targets.
    #[must_use]
    pub fn can_damage_summons(mut self, allowed: bool) -> Self {
        self.filter = if allowed {
            self.filter.with(ActorKind::Summon)
        } else {
            self.filter.without(ActorKind::Summon)
        };
        self
    }

    /// Register a hit observer.
    #[must_use]
    pub fn with_observer(mut self, observer: ZoneObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// Zone bounds.
    #[must_use]
    pub fn shape(&self) -> Aabb {
        self.shape
    }

    /// Damage per hit.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Owning actor, if any.
    #[must_use]
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Time the zone is removed, if it has a lifetime.
    #[must_use]
    pub fn expires_at(&self) -> Option<f64> {
        self.expires_at
    }

    /// Whether `target` is currently inside.
    #[must_use]
    pub fn contains_target(&self, target: EntityId) -> bool {
        self.inside.contains_key(&target)
    }

    /// Whether an actor qualifies as a target of this zone.
    #[must_use]
    pub fn accepts(&self, actor: &Actor) -> bool {
        if self.owner == Some(actor.id) {
            return false;
        }
        // Exclusion is checked before the filter.
        if self.exclude.contains(actor.kind) || self.exclude.contains(actor.kind.filter_class()) {
            return false;
        }
        self.filter.contains(actor.kind.filter_class())
    }

    fn is_due(&self, last: f64, now: f64) -> bool {
        self.rate > 0.0 && now - last + TIME_EPSILON >= self.rate
    }

    fn hit(
        &mut self,
        id: ZoneId,
        actor: &mut Actor,
        signals: &SignalBus,
        now: f64,
    ) -> DamageOutcome {
        let outcome = actor.take_damage(self.damage, now);
        if let Some((per_tick, duration)) = self.ignite {
            actor.ledger.apply_burning(per_tick, duration, now);
        }
        actor.in_zone = true;
        signals.damage_number(actor.id, outcome.total(), actor.position);
        trace!("{id} hit {} for {} at {now}", actor.id, outcome.total());

        let hit = ZoneHit {
            zone: id,
            target: actor,
            outcome,
            at: now,
        };
        for observer in &mut self.observers {
            observer(&hit);
        }
        outcome
    }
}

/// Owns every live damage zone.
#[derive(Debug)]
pub struct ZoneEngine {
    zones: BTreeMap<ZoneId, DamageZone>,
    next_id: ZoneId,
}

impl Default for ZoneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneEngine {
    /// Creates an engine with no zones.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
            next_id: ZoneId::from_raw(1),
        }
    }

    /// Registers a zone created at `now` and returns its handle.
    pub fn create_zone(&mut self, mut zone: DamageZone, now: f64) -> ZoneId {
        let id = self.next_id;
        self.next_id = id.next();
        zone.expires_at = (zone.duration > 0.0).then(|| now + zone.duration);
        debug!(
            "created {id}: {} dmg every {}s, owner {:?}, expires {:?}",
            zone.damage, zone.rate, zone.owner, zone.expires_at
        );
        self.zones.insert(id, zone);
        id
    }

    /// Adds an observer to a live zone.
    pub fn add_observer(&mut self, id: ZoneId, observer: ZoneObserver) -> CombatResult<()> {
        let zone = self.zones.get_mut(&id).ok_or(CombatError::UnknownZone(id))?;
        zone.observers.push(observer);
        Ok(())
    }

    /// Destroys a zone. Its observers go with it.
    pub fn destroy_zone(&mut self, id: ZoneId) -> bool {
        let removed = self.zones.remove(&id).is_some();
        if removed {
            debug!("destroyed {id}");
        }
        removed
    }

    /// Destroys every zone owned by `owner`. Returns how many were destroyed.
    pub fn destroy_owned_by(&mut self, owner: EntityId) -> usize {
        let before = self.zones.len();
        self.zones.retain(|_, zone| zone.owner != Some(owner));
        let destroyed = before - self.zones.len();
        if destroyed > 0 {
            debug!("destroyed {destroyed} zone(s) owned by {owner}");
        }
        destroyed
    }

    /// Drops `target` from every zone's inside set.
    pub fn forget_target(&mut self, target: EntityId) {
        for zone in self.zones.values_mut() {
            zone.inside.remove(&target);
        }
    }

    /// Gets a zone.
    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&DamageZone> {
        self.zones.get(&id)
    }

    /// Iterates zones in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &DamageZone)> {
        self.zones.iter().map(|(id, zone)| (*id, zone))
    }

    /// Number of live zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether there are no live zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Whether `target` is inside at least one zone.
    #[must_use]
    pub fn is_inside_any(&self, target: EntityId) -> bool {
        self.zones.values().any(|zone| zone.contains_target(target))
    }

    /// Routes one physics overlap report.
    pub fn handle_overlap(
        &mut self,
        event: &OverlapEvent,
        actors: &mut ActorRegistry,
        signals: &SignalBus,
        now: f64,
    ) -> Option<DamageOutcome> {
        match event.phase {
            OverlapPhase::Enter => self.on_overlap_enter(event.zone, event.target, actors, signals, now),
            OverlapPhase::Stay => {
                let inside = self
                    .zones
                    .get(&event.zone)
                    .is_some_and(|zone| zone.contains_target(event.target));
                if inside {
                    None
                } else {
                    self.on_overlap_enter(event.zone, event.target, actors, signals, now)
                }
            },
            OverlapPhase::Exit => {
                self.on_overlap_exit(event.zone, event.target, actors);
                None
            },
        }
    }

    /// An actor started overlapping a zone. Qualifying actors are hit at once.
    pub fn on_overlap_enter(
        &mut self,
        id: ZoneId,
        target: EntityId,
        actors: &mut ActorRegistry,
        signals: &SignalBus,
        now: f64,
    ) -> Option<DamageOutcome> {
        let zone = self.zones.get_mut(&id)?;
        let actor = actors.get_mut(target)?;
        if actor.is_dead() || !zone.accepts(actor) {
            return None;
        }

        zone.inside.insert(target, now);
        Some(zone.hit(id, actor, signals, now))
    }

    /// An actor stopped overlapping a zone. No further hits land.
    pub fn on_overlap_exit(&mut self, id: ZoneId, target: EntityId, actors: &mut ActorRegistry) {
        if let Some(zone) = self.zones.get_mut(&id) {
            zone.inside.remove(&target);
        }
        let still_inside = self.is_inside_any(target);
        if let Some(actor) = actors.get_mut(target) {
            actor.in_zone = still_inside;
        }
    }

    /// Applies periodic hits that fell due and removes expired zones.
    ///
    /// A hit due exactly at a zone's expiry lands before the zone goes.
    /// Returns the number of hits applied.
    pub fn tick(&mut self, actors: &mut ActorRegistry, signals: &SignalBus, now: f64) -> usize {
        let mut hits = 0;

        for (&id, zone) in &mut self.zones {
            let mut targets: Vec<(EntityId, f64)> =
                zone.inside.iter().map(|(target, last)| (*target, *last)).collect();
            targets.sort_by_key(|(target, _)| *target);

            for (target, last) in targets {
                let Some(actor) = actors.get_mut(target) else {
                    zone.inside.remove(&target);
                    continue;
                };
                if actor.is_dead() {
                    zone.inside.remove(&target);
                    continue;
                }
                if !zone.is_due(last, now) {
                    continue;
                }

                zone.inside.insert(target, now);
                zone.hit(id, actor, signals, now);
                hits += 1;
            }
        }

        let expired: Vec<ZoneId> = self
            .zones
            .iter()
            .filter(|(_, zone)| zone.expires_at.is_some_and(|at| now + TIME_EPSILON >= at))
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            self.destroy_zone(id);
        }

        self.refresh_in_zone(actors);
        hits
    }

    fn refresh_in_zone(&self, actors: &mut ActorRegistry) {
        for id in actors.ids() {
            let inside = self.is_inside_any(id);
            if let Some(actor) = actors.get_mut(id) {
                actor.in_zone = inside;
            }
        }
    }

    /// Center of a zone, if it still exists.
    #[must_use]
    pub fn center(&self, id: ZoneId) -> Option<Vec2> {
        self.zones.get(&id).map(|zone| zone.shape.center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::ledger::{EffectKind, StatusLedger};
    use crate::signals::CombatSignal;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn spawn(actors: &mut ActorRegistry, kind: ActorKind, health: f32) -> EntityId {
        actors.spawn(Actor::new(
            kind,
            Vec2::ZERO,
            Vec2::splat(0.5),
            StatusLedger::new(health, LedgerConfig::default()),
        ))
    }

    fn health(actors: &ActorRegistry, id: EntityId) -> f32 {
        actors.get(id).map_or(-1.0, |actor| actor.ledger.health())
    }

    fn zone(damage: f32, rate: f64) -> DamageZone {
        DamageZone::new(Aabb::square(Vec2::ZERO, 2.0), damage).with_rate(rate)
    }

    #[test]
    fn test_enter_stay_exit_reenter_scenario() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Enemy, 200.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(20.0, 1.0), 0.0);

        engine.on_overlap_enter(id, target, &mut actors, &signals, 0.0);
        let mut now = 0.0;
        while now < 2.5 {
            now += 0.25;
            engine.tick(&mut actors, &signals, now);
        }
        assert!((health(&actors, target) - 140.0).abs() < 1e-3);

        engine.on_overlap_exit(id, target, &mut actors);
        assert_eq!(actors.get(target).map(|actor| actor.in_zone), Some(false));
        engine.tick(&mut actors, &signals, 2.75);
        engine.tick(&mut actors, &signals, 3.0);

        engine.on_overlap_enter(id, target, &mut actors, &signals, 3.0);
        assert!((health(&actors, target) - 120.0).abs() < 1e-3);

        let numbers = signals
            .drain()
            .into_iter()
            .filter(|signal| matches!(signal, CombatSignal::ShowDamageNumber { .. }))
            .count();
        assert_eq!(numbers, 4);
    }

    #[test]
    fn test_continuous_overlap_hit_count() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Player, 1000.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(5.0, 0.5).with_duration(3.0), 0.0);

        let observed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&observed);
        engine
            .add_observer(id, Box::new(move |_hit: &ZoneHit<'_>| *counter.borrow_mut() += 1))
            .expect("zone exists");

        engine.on_overlap_enter(id, target, &mut actors, &signals, 0.0);
        let mut now = 0.0;
        for _ in 0..12 {
            now += 0.25;
            engine.tick(&mut actors, &signals, now);
        }

        // floor(3.0 / 0.5) + 1 hits, the last one at expiry.
        assert_eq!(*observed.borrow(), 7);
        assert!(engine.is_empty());
        assert!(matches!(
            engine.add_observer(id, Box::new(|_hit: &ZoneHit<'_>| {})),
            Err(CombatError::UnknownZone(_))
        ));
    }

    #[test]
    fn test_periodic_hits_measure_from_the_last_hit() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Enemy, 100.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(10.0, 1.0), 0.0);

        engine.on_overlap_enter(id, target, &mut actors, &signals, 0.0);
        assert_eq!(engine.tick(&mut actors, &signals, 1.3), 1);
        // 0.8s after the hit at 1.3: not due yet.
        assert_eq!(engine.tick(&mut actors, &signals, 2.1), 0);
        assert_eq!(engine.tick(&mut actors, &signals, 2.3), 1);
        assert!((health(&actors, target) - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_igniting_zone_sets_target_burning() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Player, 100.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(10.0, 0.0).with_burning(3.0, 1.0), 0.0);

        engine.on_overlap_enter(id, target, &mut actors, &signals, 0.0);
        let ledger = &mut actors.get_mut(target).expect("target").ledger;
        assert!(ledger.effects().iter().any(|effect| effect.kind == EffectKind::Burning));
        let report = ledger.tick(0.5);
        assert!((report.burn_damage - 3.0).abs() < 1e-3);
        assert!((ledger.health() - 87.0).abs() < 1e-3);
    }

    #[test]
    fn test_exclusion_and_filter() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let player = spawn(&mut actors, ActorKind::Player, 100.0);
        let boss = spawn(&mut actors, ActorKind::Boss, 100.0);
        let summon = spawn(&mut actors, ActorKind::Summon, 100.0);
        let mut engine = ZoneEngine::new();

        let friendly = engine.create_zone(
            zone(10.0, 1.0)
                .excludes_player(true)
                .can_damage_enemies(true)
                .can_damage_summons(false),
            0.0,
        );
        assert!(engine.on_overlap_enter(friendly, player, &mut actors, &signals, 0.0).is_none());
        assert!(engine.on_overlap_enter(friendly, summon, &mut actors, &signals, 0.0).is_none());
        assert!(engine.on_overlap_enter(friendly, boss, &mut actors, &signals, 0.0).is_some());

        // Ignored targets leave no state behind.
        let zone_ref = engine.get(friendly).expect("zone exists");
        assert!(!zone_ref.contains_target(player));
        assert!(zone_ref.contains_target(boss));
    }

    #[test]
    fn test_zone_never_hits_owner() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let boss = spawn(&mut actors, ActorKind::Boss, 100.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(10.0, 1.0).with_owner(boss), 0.0);

        assert!(engine.on_overlap_enter(id, boss, &mut actors, &signals, 0.0).is_none());
        assert_eq!(engine.destroy_owned_by(boss), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_zones_rate_limit_independently() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Enemy, 100.0);
        let mut engine = ZoneEngine::new();
        let a = engine.create_zone(zone(10.0, 1.0), 0.0);
        let b = engine.create_zone(zone(5.0, 1.0), 0.0);

        engine.on_overlap_enter(a, target, &mut actors, &signals, 0.0);
        engine.on_overlap_enter(b, target, &mut actors, &signals, 0.0);
        assert_eq!(engine.tick(&mut actors, &signals, 1.0), 2);
        assert!((health(&actors, target) - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_destroyed_and_dead_targets_are_dropped() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let gone = spawn(&mut actors, ActorKind::Enemy, 100.0);
        let fragile = spawn(&mut actors, ActorKind::Enemy, 10.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(10.0, 1.0), 0.0);

        engine.on_overlap_enter(id, gone, &mut actors, &signals, 0.0);
        engine.on_overlap_enter(id, fragile, &mut actors, &signals, 0.0);
        actors.despawn(gone);

        assert_eq!(engine.tick(&mut actors, &signals, 1.0), 0);
        let zone_ref = engine.get(id).expect("zone exists");
        assert!(!zone_ref.contains_target(gone));
        assert!(!zone_ref.contains_target(fragile));
    }

    #[test]
    fn test_stay_acts_as_enter_once() {
        let mut actors = ActorRegistry::new();
        let signals = SignalBus::default();
        let target = spawn(&mut actors, ActorKind::Summon, 100.0);
        let mut engine = ZoneEngine::new();
        let id = engine.create_zone(zone(10.0, 0.0), 0.0);

        let stay = OverlapEvent::stay(id, target);
        assert!(engine.handle_overlap(&stay, &mut actors, &signals, 0.0).is_some());
        assert!(engine.handle_overlap(&stay, &mut actors, &signals, 0.5).is_none());
        assert_eq!(engine.tick(&mut actors, &signals, 5.0), 0);
        assert!((health(&actors, target) - 90.0).abs() < 1e-3);
    }
}
