//! Actors and the per-kind actor registry.
//!
//! Players, enemies, bosses and summons share one [`Actor`] record and the
//! [`Combatant`] capability set. The [`ActorRegistry`] keeps a per-kind index
//! so target queries only visit the kinds they ask for.

use ahash::AHashMap;
use glam::Vec2;
use skirmish_common::{Aabb, ActorKind, EntityId, KindSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::{AdversaryConfig, LedgerConfig, PlayerConfig, SummonConfig};
use crate::ledger::{DamageOutcome, StatusLedger};

/// Capabilities every participant in combat provides.
pub trait Combatant {
    /// Stable identifier.
    fn id(&self) -> EntityId;
    /// Actor kind.
    fn kind(&self) -> ActorKind;
    /// World position (center of the hurtbox).
    fn position(&self) -> Vec2;
    /// Whether the actor is dead.
    fn is_dead(&self) -> bool;
    /// Applies one damage event.
    fn take_damage(&mut self, amount: f32, now: f64) -> DamageOutcome;
}

/// A combat participant.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Actor ID.
    pub id: EntityId,
    /// Actor kind.
    pub kind: ActorKind,
    /// Current position.
    pub position: Vec2,
    /// Where the actor spawned and respawns.
    pub spawn_position: Vec2,
    /// Half extents of the hurtbox.
    pub half_extents: Vec2,
    /// Health, shield and effects.
    pub ledger: StatusLedger,
    /// Ground contact reported by physics.
    pub grounded: bool,
    /// Whether the actor is inside at least one damage zone.
    pub in_zone: bool,
    /// Actor this one fights for (summons).
    pub owner: Option<EntityId>,
}

impl Actor {
    /// Creates an actor with a fresh ID.
    #[must_use]
    pub fn new(kind: ActorKind, position: Vec2, half_extents: Vec2, ledger: StatusLedger) -> Self {
        Self {
            id: EntityId::new(),
            kind,
            position,
            spawn_position: position,
            half_extents,
            ledger,
            grounded: true,
            in_zone: false,
            owner: None,
        }
    }

    /// Creates a player from its profile.
    #[must_use]
    pub fn player(position: Vec2, profile: &PlayerConfig, ledger: &LedgerConfig) -> Self {
        Self::new(
            ActorKind::Player,
            position,
            profile.hitbox,
            StatusLedger::new(profile.max_health, ledger.clone()),
        )
    }

    /// Creates a boss or enemy from its profile.
    #[must_use]
    pub fn adversary(
        kind: ActorKind,
        position: Vec2,
        profile: &AdversaryConfig,
        ledger: &LedgerConfig,
    ) -> Self {
        Self::new(
            kind,
            position,
            profile.hitbox,
            StatusLedger::new(profile.max_health, ledger.clone()),
        )
    }

    /// Creates a summon fighting for `owner`.
    #[must_use]
    pub fn summon(owner: EntityId, position: Vec2, profile: &SummonConfig, ledger: &LedgerConfig) -> Self {
        Self::new(
            ActorKind::Summon,
            position,
            profile.hitbox,
            StatusLedger::new(profile.health, ledger.clone()),
        )
        .with_owner(owner)
    }

    /// Set the owning actor.
    #[must_use]
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Hurtbox in world space.
    #[must_use]
    pub fn hurtbox(&self) -> Aabb {
        Aabb::new(self.position, self.half_extents)
    }

    /// Resets the actor to its spawn state.
    pub fn respawn(&mut self) {
        self.ledger.reset();
        self.position = self.spawn_position;
        self.grounded = true;
        self.in_zone = false;
    }
}

impl Combatant for Actor {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> ActorKind {
        self.kind
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_dead(&self) -> bool {
        self.ledger.is_dead()
    }

    fn take_damage(&mut self, amount: f32, now: f64) -> DamageOutcome {
        self.ledger.apply_damage(amount, now)
    }
}

/// All live actors, indexed by kind.
#[derive(Debug, Default)]
pub struct ActorRegistry {
    actors: AHashMap<EntityId, Actor>,
    by_kind: BTreeMap<ActorKind, BTreeSet<EntityId>>,
}

impl ActorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor and returns its ID.
    pub fn spawn(&mut self, actor: Actor) -> EntityId {
        let id = actor.id;
        debug!("spawned {} {id} at {}", actor.kind, actor.position);
        self.by_kind.entry(actor.kind).or_default().insert(id);
        self.actors.insert(id, actor);
        id
    }

    /// Removes an actor.
    pub fn despawn(&mut self, id: EntityId) -> Option<Actor> {
        let actor = self.actors.remove(&id)?;
        if let Some(ids) = self.by_kind.get_mut(&actor.kind) {
            ids.remove(&id);
        }
        debug!("despawned {} {id}", actor.kind);
        Some(actor)
    }

    /// Gets an actor.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Gets an actor mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Whether the actor exists (dead or alive).
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Whether the actor exists and is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|actor| !actor.is_dead())
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether there are no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// IDs of every actor of the given kinds, in kind then ID order.
    #[must_use]
    pub fn ids_of(&self, kinds: KindSet) -> Vec<EntityId> {
        kinds
            .iter()
            .filter_map(|kind| self.by_kind.get(&kind))
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }

    /// Every actor ID in kind then ID order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.ids_of(KindSet::ALL)
    }

    /// Iterates actors of the given kinds.
    pub fn iter_kinds(&self, kinds: KindSet) -> impl Iterator<Item = &Actor> {
        kinds
            .iter()
            .filter_map(|kind| self.by_kind.get(&kind))
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.actors.get(id))
    }

    /// Live actors of `kind` owned by `owner`.
    #[must_use]
    pub fn owned_by(&self, owner: EntityId, kind: ActorKind) -> Vec<EntityId> {
        self.iter_kinds(kind.into())
            .filter(|actor| actor.owner == Some(owner))
            .map(|actor| actor.id)
            .collect()
    }

    /// Nearest live actor of the given kinds within `radius` of `from`.
    ///
    /// Ties on distance go to the lowest ID.
    #[must_use]
    pub fn nearest(&self, kinds: KindSet, from: Vec2, radius: f32) -> Option<EntityId> {
        self.iter_kinds(kinds)
            .filter(|actor| !actor.is_dead())
            .map(|actor| (actor.position.distance(from), actor.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(kind: ActorKind, x: f32) -> Actor {
        Actor::new(
            kind,
            Vec2::new(x, 0.0),
            Vec2::splat(0.5),
            StatusLedger::new(50.0, LedgerConfig::default()),
        )
    }

    #[test]
    fn test_spawn_and_despawn_keep_index() {
        let mut registry = ActorRegistry::new();
        let player = registry.spawn(actor(ActorKind::Player, 0.0));
        let boss = registry.spawn(actor(ActorKind::Boss, 5.0));

        assert_eq!(registry.ids_of(KindSet::HOSTILES), vec![boss]);
        assert!(registry.despawn(boss).is_some());
        assert!(registry.ids_of(KindSet::HOSTILES).is_empty());
        assert!(registry.contains(player));
        assert!(registry.despawn(boss).is_none());
    }

    #[test]
    fn test_nearest_respects_kinds_radius_and_death() {
        let mut registry = ActorRegistry::new();
        let near_enemy = registry.spawn(actor(ActorKind::Enemy, 1.0));
        let summon = registry.spawn(actor(ActorKind::Summon, 2.0));
        let player = registry.spawn(actor(ActorKind::Player, 3.0));

        assert_eq!(registry.nearest(KindSet::ALLIES, Vec2::ZERO, 10.0), Some(summon));
        assert_eq!(registry.nearest(KindSet::ALLIES, Vec2::ZERO, 1.5), None);
        assert_eq!(registry.nearest(KindSet::ALL, Vec2::ZERO, 10.0), Some(near_enemy));

        if let Some(summon) = registry.get_mut(summon) {
            summon.take_damage(100.0, 0.0);
        }
        assert_eq!(registry.nearest(KindSet::ALLIES, Vec2::ZERO, 10.0), Some(player));
    }

    #[test]
    fn test_nearest_tie_goes_to_lowest_id() {
        let mut registry = ActorRegistry::new();
        let first = registry.spawn(actor(ActorKind::Player, 2.0));
        let _second = registry.spawn(actor(ActorKind::Summon, -2.0));

        assert_eq!(registry.nearest(KindSet::ALLIES, Vec2::ZERO, 5.0), Some(first));
    }

    #[test]
    fn test_owned_by() {
        let mut registry = ActorRegistry::new();
        let player = registry.spawn(actor(ActorKind::Player, 0.0));
        let summon = registry.spawn(actor(ActorKind::Summon, 1.0).with_owner(player));
        registry.spawn(actor(ActorKind::Summon, 1.0));

        assert_eq!(registry.owned_by(player, ActorKind::Summon), vec![summon]);
    }

    #[test]
    fn test_respawn_restores_spawn_state() {
        let mut boss = actor(ActorKind::Boss, 4.0);
        boss.position = Vec2::new(9.0, 3.0);
        boss.grounded = false;
        boss.take_damage(80.0, 1.0);
        assert!(boss.is_dead());

        boss.respawn();
        assert!(!boss.is_dead());
        assert_eq!(boss.position, Vec2::new(4.0, 0.0));
        assert!(boss.grounded);
    }
}
