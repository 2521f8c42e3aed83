//! Projectiles in flight and the redirect protocol.
//!
//! Player seekers carry a redirect budget; each accepted redirect consumes
//! one unit and re-aims the projectile at the nearest valid target. Volley
//! shots and hostile bolts have no budget and fly straight.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{Aabb, EntityId, KindSet, ProjectileId, TIME_EPSILON};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::actor::{ActorRegistry, Combatant};
use crate::ledger::DamageOutcome;
use crate::signals::SignalBus;

// ============================================================================
// Projectile
// ============================================================================

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Firing actor. Cleared when the owner is destroyed.
    pub owner: Option<EntityId>,
    /// Current position.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Damage on hit.
    pub damage: f32,
    /// Kinds this projectile can strike.
    pub filter: KindSet,
    /// Distance at which it strikes a hurtbox.
    pub hit_radius: f32,
    /// Redirects left.
    pub redirects_left: u32,
    /// Set once the budget runs out; no further redirects are accepted.
    pub expired: bool,
    /// Actor the projectile is homing on.
    pub homing: Option<EntityId>,
    /// Seconds the projectile flies before vanishing.
    pub lifetime: f64,
    /// Simulation time it vanishes, set on spawn.
    pub expires_at: f64,
}

impl Projectile {
    /// Creates a projectile with no owner, no budget and a 3 second lifetime.
    #[must_use]
    pub fn new(position: Vec2, velocity: Vec2, damage: f32) -> Self {
        Self {
            owner: None,
            position,
            velocity,
            damage,
            filter: KindSet::ALL,
            hit_radius: 0.5,
            redirects_left: 0,
            expired: false,
            homing: None,
            lifetime: 3.0,
            expires_at: f64::INFINITY,
        }
    }

    /// Set the firing actor.
    #[must_use]
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set the kinds it can strike.
    #[must_use]
    pub fn with_filter(mut self, filter: KindSet) -> Self {
        self.filter = filter;
        self
    }

    /// Set the redirect budget.
    #[must_use]
    pub fn with_redirect_budget(mut self, budget: u32) -> Self {
        self.redirects_left = budget;
        self
    }

    /// Set the lifetime in seconds.
    #[must_use]
    pub fn with_lifetime(mut self, seconds: f64) -> Self {
        self.lifetime = seconds;
        self
    }

    /// Set the strike distance.
    #[must_use]
    pub fn with_hit_radius(mut self, radius: f32) -> Self {
        self.hit_radius = radius;
        self
    }

    /// Whether this projectile was fired with a redirect budget.
    #[must_use]
    pub fn is_redirectable(&self) -> bool {
        self.redirects_left > 0 || self.expired
    }

    /// Travel speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    fn aim_at(&mut self, point: Vec2) {
        let direction = (point - self.position).normalize_or_zero();
        if direction != Vec2::ZERO {
            self.velocity = direction * self.speed();
        }
    }
}

// ============================================================================
// Redirects
// ============================================================================

/// Why a redirect request was refused. The projectile is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectRejection {
    /// No such projectile in flight.
    UnknownProjectile,
    /// The projectile was fired without a budget.
    BudgetExhausted,
    /// The budget ran out on an earlier redirect.
    Expired,
    /// The firing actor has been destroyed.
    OwnerGone,
}

/// Result of a redirect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Re-aimed at `target`; one unit of budget consumed.
    Redirected {
        /// New target
        target: EntityId,
        /// Redirects left afterwards
        remaining: u32,
    },
    /// No valid target in range. Nothing consumed.
    NoTarget,
    /// Refused.
    Rejected(RedirectRejection),
}

/// A projectile strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileImpact {
    /// Projectile that struck.
    pub projectile: ProjectileId,
    /// Actor struck.
    pub target: EntityId,
    /// What the hit did.
    pub outcome: DamageOutcome,
}

// ============================================================================
// Store
// ============================================================================

/// Every projectile in flight.
#[derive(Debug)]
pub struct ProjectileStore {
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_id: ProjectileId,
}

impl Default for ProjectileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            projectiles: BTreeMap::new(),
            next_id: ProjectileId::from_raw(1),
        }
    }

    /// Launches a projectile at `now`.
    pub fn spawn(&mut self, mut projectile: Projectile, now: f64) -> ProjectileId {
        let id = self.next_id;
        self.next_id = id.next();
        projectile.expires_at = now + projectile.lifetime.max(0.0);
        trace!("launched {id} from {} owner {:?}", projectile.position, projectile.owner);
        self.projectiles.insert(id, projectile);
        id
    }

    /// Gets a projectile.
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Removes a projectile.
    pub fn remove(&mut self, id: ProjectileId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    /// Number in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Oldest redirectable projectile fired by `owner` still in flight.
    #[must_use]
    pub fn seeker_of(&self, owner: EntityId) -> Option<ProjectileId> {
        self.projectiles
            .iter()
            .find(|(_, projectile)| projectile.owner == Some(owner) && projectile.is_redirectable())
            .map(|(id, _)| *id)
    }

    /// Asks a projectile to re-home on the nearest valid target within `radius`.
    pub fn redirect(&mut self, id: ProjectileId, actors: &ActorRegistry, radius: f32) -> RedirectOutcome {
        let Some(projectile) = self.projectiles.get_mut(&id) else {
            return RedirectOutcome::Rejected(RedirectRejection::UnknownProjectile);
        };
        if projectile.expired {
            return RedirectOutcome::Rejected(RedirectRejection::Expired);
        }
        if projectile.redirects_left == 0 {
            return RedirectOutcome::Rejected(RedirectRejection::BudgetExhausted);
        }
        let Some(owner) = projectile.owner else {
            return RedirectOutcome::Rejected(RedirectRejection::OwnerGone);
        };

        let candidates = projectile.filter;
        let target = actors
            .iter_kinds(candidates)
            .filter(|actor| actor.id != owner && !actor.is_dead())
            .map(|actor| (actor.position.distance(projectile.position), actor.id, actor.position))
            .filter(|(distance, _, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let Some((_, target, position)) = target else {
            return RedirectOutcome::NoTarget;
        };

        projectile.redirects_left -= 1;
        projectile.homing = Some(target);
        projectile.aim_at(position);
        if projectile.redirects_left == 0 {
            projectile.expired = true;
        }
        debug!("{id} redirected to {target}, {} left", projectile.redirects_left);

        RedirectOutcome::Redirected {
            target,
            remaining: projectile.redirects_left,
        }
    }

    /// Clears `owner` from every projectile it fired. Returns how many.
    pub fn detach_owner(&mut self, owner: EntityId) -> usize {
        let mut detached = 0;
        for projectile in self.projectiles.values_mut() {
            if projectile.owner == Some(owner) {
                projectile.owner = None;
                detached += 1;
            }
        }
        detached
    }

    /// Moves projectiles, resolves strikes and removes expired ones.
    pub fn tick(
        &mut self,
        actors: &mut ActorRegistry,
        signals: &SignalBus,
        dt: f64,
        now: f64,
    ) -> Vec<ProjectileImpact> {
        let mut impacts = Vec::new();
        let mut finished = Vec::new();

        for (&id, projectile) in &mut self.projectiles {
            if now + TIME_EPSILON >= projectile.expires_at {
                finished.push(id);
                continue;
            }

            if let Some(target) = projectile.homing {
                match actors.get(target) {
                    Some(actor) if !actor.is_dead() => projectile.aim_at(actor.position),
                    _ => projectile.homing = None,
                }
            }
            #[allow(clippy::cast_possible_truncation)]
            let step = dt as f32;
            projectile.position += projectile.velocity * step;

            let struck = actors
                .iter_kinds(projectile.filter)
                .filter(|actor| Some(actor.id) != projectile.owner && !actor.is_dead())
                .find(|actor| {
                    Aabb::new(actor.position, actor.half_extents + Vec2::splat(projectile.hit_radius))
                        .contains(projectile.position)
                })
                .map(|actor| actor.id);

            if let Some(target) = struck {
                if let Some(actor) = actors.get_mut(target) {
                    let outcome = actor.take_damage(projectile.damage, now);
                    signals.damage_number(target, outcome.total(), actor.position);
                    impacts.push(ProjectileImpact {
                        projectile: id,
                        target,
                        outcome,
                    });
                }
                finished.push(id);
            }
        }

        for id in finished {
            self.projectiles.remove(&id);
        }
        impacts
    }
}
