//! Status effect ledger.
//!
//! Every actor owns one [`StatusLedger`] holding its health, its Aegis shield
//! pool and its timed effects:
//! - Timed effects stack according to their kind's [`StackRule`]
//! - Durability raises max health; health and shield keep their share of max
//!   when it changes
//! - Incoming damage drains the shield before health, in a single call
//! - Health regenerates after a quiet period without damage
//! - Burning deals periodic damage straight to health

use serde::{Deserialize, Serialize};
use skirmish_common::TIME_EPSILON;
use tracing::{trace, warn};

use crate::config::LedgerConfig;

// ============================================================================
// Effects
// ============================================================================

/// Kinds of timed status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Flat outgoing damage bonus in percent. One instance at a time.
    Attack,
    /// Flat max health bonus.
    Durability,
    /// Outgoing damage bonus in percent.
    Strength,
    /// Regeneration bonus in percent.
    Vitality,
    /// Cooldown reduction in percent.
    Flux,
    /// Movement speed bonus in percent.
    Swiftness,
    /// Damage over time that ignores the shield.
    Burning,
}

/// How a new instance of an effect combines with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackRule {
    /// The new instance replaces any existing one.
    ReplaceSingle,
    /// Instances are independent and their magnitudes add up.
    StackAdditive,
    /// Re-application extends the remaining duration of the live instance.
    ExtendDuration,
}

impl EffectKind {
    /// Stacking rule for this kind.
    #[must_use]
    pub const fn stack_rule(self) -> StackRule {
        match self {
            Self::Attack => StackRule::ReplaceSingle,
            Self::Burning => StackRule::ExtendDuration,
            Self::Durability | Self::Strength | Self::Vitality | Self::Flux | Self::Swiftness => {
                StackRule::StackAdditive
            },
        }
    }
}

/// A live timed effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Effect kind.
    pub kind: EffectKind,
    /// Magnitude (percent, flat amount or damage per tick depending on kind).
    pub magnitude: f32,
    /// Simulation time the instance started.
    pub start: f64,
    /// Seconds the instance lasts.
    pub duration: f64,
}

impl ActiveEffect {
    /// Time at which the instance expires.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether the instance has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now + TIME_EPSILON >= self.end()
    }
}

/// Result of applying a timed effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// A new instance was added.
    Added,
    /// The existing single instance was replaced.
    Replaced,
    /// The live instance's duration was extended.
    Extended,
    /// The stack cap for this kind was reached. Nothing changed.
    StackCapped,
    /// Zero magnitude, zero duration or a dead actor. Nothing changed.
    Ignored,
}

/// Result of adding to the shield pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldGrant {
    /// Shield actually added.
    pub granted: f32,
    /// True when less than requested was added because of a cap.
    pub capped: bool,
}

/// Result of one damage event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Damage soaked up by the shield.
    pub absorbed: f32,
    /// Health removed.
    pub health_lost: f32,
    /// Whether this event killed the actor.
    pub killed: bool,
}

impl DamageOutcome {
    /// Shield and health damage combined.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.absorbed + self.health_lost
    }
}

/// What a ledger tick did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// Kinds of the instances removed because they expired.
    pub expired: Vec<EffectKind>,
    /// Health lost to burning.
    pub burn_damage: f32,
    /// Health restored by regeneration.
    pub regenerated: f32,
    /// Whether burning killed the actor during this tick.
    pub died: bool,
}

// ============================================================================
// Ledger
// ============================================================================

/// Health, shield and timed effects of one actor.
#[derive(Debug, Clone)]
pub struct StatusLedger {
    base_max_health: f32,
    max_health: f32,
    health: f32,
    shield: f32,
    /// Shield added so far by capped sources.
    capped_total: f32,
    effects: Vec<ActiveEffect>,
    burn_next_tick: Option<f64>,
    last_damage_time: Option<f64>,
    regen_next_at: Option<f64>,
    dead: bool,
    config: LedgerConfig,
}

impl StatusLedger {
    /// Creates a full-health ledger.
    #[must_use]
    pub fn new(base_max_health: f32, config: LedgerConfig) -> Self {
        let base = Self::safe_max(base_max_health);
        Self {
            base_max_health: base,
            max_health: base,
            health: base,
            shield: 0.0,
            capped_total: 0.0,
            effects: Vec::new(),
            burn_next_tick: None,
            last_damage_time: None,
            regen_next_at: None,
            dead: false,
            config,
        }
    }

    fn safe_max(value: f32) -> f32 {
        debug_assert!(value >= 1.0, "max health must be at least 1, got {value}");
        if value.is_finite() && value >= 1.0 {
            value
        } else {
            warn!("max health {value} out of range, clamping to 1");
            1.0
        }
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Current max health, including Durability.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Max health without any effects.
    #[must_use]
    pub fn base_max_health(&self) -> f32 {
        self.base_max_health
    }

    /// Current shield.
    #[must_use]
    pub fn shield(&self) -> f32 {
        self.shield
    }

    /// Shield ceiling. The pool can never exceed max health.
    #[must_use]
    pub fn max_shield(&self) -> f32 {
        self.max_health
    }

    /// Shield currently attributed to capped sources.
    #[must_use]
    pub fn capped_shield_total(&self) -> f32 {
        self.capped_total
    }

    /// Health as a fraction of max health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Whether health has reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Live effect instances.
    #[must_use]
    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Time of the last damage event, if any.
    #[must_use]
    pub fn last_damage_time(&self) -> Option<f64> {
        self.last_damage_time
    }

    /// Adds a timed effect.
    pub fn apply_effect(
        &mut self,
        kind: EffectKind,
        magnitude: f32,
        duration: f64,
        now: f64,
    ) -> EffectOutcome {
        if self.dead || magnitude <= 0.0 || duration <= 0.0 || !magnitude.is_finite() {
            return EffectOutcome::Ignored;
        }

        let outcome = match kind.stack_rule() {
            StackRule::ReplaceSingle => {
                let before = self.effects.len();
                self.effects.retain(|effect| effect.kind != kind);
                self.effects.push(ActiveEffect {
                    kind,
                    magnitude,
                    start: now,
                    duration,
                });
                if before == self.effects.len() {
                    EffectOutcome::Replaced
                } else {
                    EffectOutcome::Added
                }
            },
            StackRule::StackAdditive => {
                let live = self
                    .effects
                    .iter()
                    .filter(|effect| effect.kind == kind && !effect.is_expired(now))
                    .count();
                if live >= self.config.max_stacks {
                    return EffectOutcome::StackCapped;
                }
                self.effects.push(ActiveEffect {
                    kind,
                    magnitude,
                    start: now,
                    duration,
                });
                EffectOutcome::Added
            },
            StackRule::ExtendDuration => self.extend_or_add(kind, magnitude, duration, now),
        };

        trace!("applied {kind:?} x{magnitude} for {duration}s: {outcome:?}");
        if kind == EffectKind::Durability {
            self.recompute_max_health(now);
        }
        outcome
    }

    fn extend_or_add(
        &mut self,
        kind: EffectKind,
        magnitude: f32,
        duration: f64,
        now: f64,
    ) -> EffectOutcome {
        if let Some(effect) = self
            .effects
            .iter_mut()
            .find(|effect| effect.kind == kind && !effect.is_expired(now))
        {
            let remaining = (effect.end() - now).max(0.0);
            effect.start = now;
            effect.duration = remaining + duration;
            effect.magnitude = effect.magnitude.max(magnitude);
            return EffectOutcome::Extended;
        }

        // A lapsed instance no tick has swept yet starts over.
        self.effects.retain(|effect| effect.kind != kind);

        self.effects.push(ActiveEffect {
            kind,
            magnitude,
            start: now,
            duration,
        });
        if kind == EffectKind::Burning {
            self.burn_next_tick = Some(now + self.config.burn_interval);
        }
        EffectOutcome::Added
    }

    /// Sets the actor burning for `damage_per_tick` over `duration` seconds.
    pub fn apply_burning(&mut self, damage_per_tick: f32, duration: f64, now: f64) -> EffectOutcome {
        self.apply_effect(EffectKind::Burning, damage_per_tick, duration, now)
    }

    /// Adds to the Aegis shield pool.
    ///
    /// With a cap, the running total added by capped sources never exceeds
    /// `cap_percent` of current max health. Without one the pool can fill up
    /// to max health.
    pub fn apply_shield(&mut self, amount: f32, cap_percent: Option<f32>) -> ShieldGrant {
        if self.dead || amount <= 0.0 || !amount.is_finite() {
            return ShieldGrant {
                granted: 0.0,
                capped: false,
            };
        }

        let pool_room = (self.max_shield() - self.shield).max(0.0);
        let granted = match cap_percent {
            Some(percent) => {
                let cap = self.max_health * percent.clamp(0.0, 100.0) / 100.0;
                let cap_room = (cap - self.capped_total).max(0.0);
                let granted = amount.min(cap_room).min(pool_room);
                self.capped_total += granted;
                granted
            },
            None => amount.min(pool_room),
        };
        self.shield += granted;
        self.enforce_bounds();

        ShieldGrant {
            granted,
            capped: granted < amount,
        }
    }

    /// Applies one damage event: shield first, remainder to health.
    ///
    /// Runs to completion in one call so no other damage can observe a
    /// half-applied event.
    pub fn apply_damage(&mut self, amount: f32, now: f64) -> DamageOutcome {
        if self.dead || amount <= 0.0 || !amount.is_finite() {
            return DamageOutcome::default();
        }

        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.capped_total = self.capped_total.min(self.shield);

        let health_lost = (amount - absorbed).min(self.health);
        self.health -= health_lost;
        self.mark_damaged(now);

        let killed = self.check_death();
        self.enforce_bounds();
        DamageOutcome {
            absorbed,
            health_lost,
            killed,
        }
    }

    /// Restores health up to max. Returns the amount healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 || !amount.is_finite() {
            return 0.0;
        }
        let healed = amount.min(self.max_health - self.health).max(0.0);
        self.health += healed;
        healed
    }

    /// Sum of the magnitudes of all unexpired instances of `kind`.
    #[must_use]
    pub fn aggregate_modifier(&self, kind: EffectKind, now: f64) -> f32 {
        self.effects
            .iter()
            .filter(|effect| effect.kind == kind && !effect.is_expired(now))
            .map(|effect| effect.magnitude)
            .sum()
    }

    /// Multiplier on outgoing damage from Strength and Attack.
    #[must_use]
    pub fn outgoing_damage_multiplier(&self, now: f64) -> f32 {
        let percent = self.aggregate_modifier(EffectKind::Strength, now)
            + self.aggregate_modifier(EffectKind::Attack, now);
        1.0 + percent / 100.0
    }

    /// Divisor applied to cooldowns from Flux.
    #[must_use]
    pub fn cooldown_divisor(&self, now: f64) -> f64 {
        1.0 + f64::from(self.aggregate_modifier(EffectKind::Flux, now)) / 100.0
    }

    /// Multiplier on movement speed from Swiftness.
    #[must_use]
    pub fn speed_multiplier(&self, now: f64) -> f32 {
        1.0 + self.aggregate_modifier(EffectKind::Swiftness, now) / 100.0
    }

    /// Advances the ledger to `now`.
    ///
    /// Applies burning ticks that fell due, removes expired instances,
    /// recomputes max health and runs regeneration. Calling it again with the
    /// same `now` changes nothing.
    pub fn tick(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();

        report.burn_damage = self.tick_burning(now);
        report.died = self.check_death();

        let mut expired = Vec::new();
        self.effects.retain(|effect| {
            if effect.is_expired(now) {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        if expired.contains(&EffectKind::Burning) {
            self.burn_next_tick = None;
        }
        report.expired = expired;

        self.recompute_max_health(now);
        report.regenerated = self.tick_regen(now);
        self.enforce_bounds();
        report
    }

    fn tick_burning(&mut self, now: f64) -> f32 {
        let Some((end, per_tick)) = self
            .effects
            .iter()
            .find(|effect| effect.kind == EffectKind::Burning)
            .map(|effect| (effect.end(), effect.magnitude))
        else {
            return 0.0;
        };

        let mut dealt = 0.0;
        while let Some(at) = self.burn_next_tick {
            if self.dead || at > now + TIME_EPSILON || at > end + TIME_EPSILON {
                break;
            }
            let lost = per_tick.min(self.health);
            self.health -= lost;
            dealt += lost;
            self.mark_damaged(at);
            self.burn_next_tick = Some(at + self.config.burn_interval);
            if self.health <= 0.0 {
                self.health = 0.0;
                self.dead = true;
            }
        }
        dealt
    }

    fn tick_regen(&mut self, now: f64) -> f32 {
        if self.dead || self.health >= self.max_health {
            self.regen_next_at = None;
            return 0.0;
        }

        let eligible_at = self
            .last_damage_time
            .map_or(f64::NEG_INFINITY, |at| at + self.config.regen_delay);
        if now + TIME_EPSILON < eligible_at {
            return 0.0;
        }

        let pulse = self.config.regen_rate
            * (1.0 + self.aggregate_modifier(EffectKind::Vitality, now) / 100.0);
        let mut next_at = *self
            .regen_next_at
            .get_or_insert(now + self.config.regen_interval);

        let mut restored = 0.0;
        while next_at <= now + TIME_EPSILON && self.health < self.max_health && pulse > 0.0 {
            let healed = pulse.min(self.max_health - self.health);
            self.health += healed;
            restored += healed;
            next_at += self.config.regen_interval;
        }

        self.regen_next_at = if self.health >= self.max_health {
            None
        } else {
            Some(next_at)
        };
        restored
    }

    fn recompute_max_health(&mut self, now: f64) {
        let target = Self::safe_max(
            self.base_max_health + self.aggregate_modifier(EffectKind::Durability, now),
        );
        if (target - self.max_health).abs() <= f32::EPSILON {
            return;
        }

        let ratio = target / self.max_health;
        self.health = (self.health * ratio).min(target);
        self.shield = (self.shield * ratio).min(target);
        self.capped_total = (self.capped_total * ratio).min(self.shield);
        trace!("max health {} -> {target}", self.max_health);
        self.max_health = target;
    }

    fn mark_damaged(&mut self, at: f64) {
        self.last_damage_time = Some(self.last_damage_time.map_or(at, |last| last.max(at)));
        self.regen_next_at = None;
    }

    fn check_death(&mut self) -> bool {
        if !self.dead && self.health <= 0.0 {
            self.health = 0.0;
            self.dead = true;
            return true;
        }
        false
    }

    fn enforce_bounds(&mut self) {
        debug_assert!(self.health >= 0.0 && self.health <= self.max_health + 1e-3);
        debug_assert!(self.shield >= 0.0 && self.shield <= self.max_shield() + 1e-3);
        self.health = self.health.clamp(0.0, self.max_health);
        self.shield = self.shield.clamp(0.0, self.max_shield());
        self.capped_total = self.capped_total.clamp(0.0, self.shield);
    }

    /// Restores the freshly spawned state: full health, no shield, no effects.
    pub fn reset(&mut self) {
        self.max_health = self.base_max_health;
        self.health = self.base_max_health;
        self.shield = 0.0;
        self.capped_total = 0.0;
        self.effects.clear();
        self.burn_next_tick = None;
        self.last_damage_time = None;
        self.regen_next_at = None;
        self.dead = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ledger(max: f32) -> StatusLedger {
        StatusLedger::new(max, LedgerConfig::default())
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_shield_absorbs_before_health() {
        let mut ledger = ledger(100.0);
        ledger.apply_damage(50.0, 0.0);
        ledger.apply_shield(30.0, None);

        let outcome = ledger.apply_damage(40.0, 1.0);

        assert!(approx(ledger.shield(), 0.0));
        assert!(approx(ledger.health(), 40.0));
        assert!(approx(outcome.absorbed, 30.0));
        assert!(approx(outcome.health_lost, 10.0));
        assert!(!outcome.killed);
    }

    #[test]
    fn test_lethal_damage_kills_once() {
        let mut ledger = ledger(20.0);
        assert!(ledger.apply_damage(25.0, 0.0).killed);
        assert!(ledger.is_dead());
        assert_eq!(ledger.apply_damage(5.0, 0.1), DamageOutcome::default());
        assert!(approx(ledger.heal(10.0), 0.0));
    }

    #[test]
    fn test_additive_stacking_sums_percentages() {
        let mut ledger = ledger(100.0);
        ledger.apply_effect(EffectKind::Strength, 10.0, 5.0, 0.0);
        ledger.apply_effect(EffectKind::Strength, 10.0, 5.0, 0.0);

        assert!(approx(ledger.aggregate_modifier(EffectKind::Strength, 1.0), 20.0));
        assert!(approx(ledger.outgoing_damage_multiplier(1.0), 1.2));
    }

    #[test]
    fn test_replace_single_keeps_one_instance() {
        let mut ledger = ledger(100.0);
        assert_eq!(
            ledger.apply_effect(EffectKind::Attack, 10.0, 5.0, 0.0),
            EffectOutcome::Added
        );
        assert_eq!(
            ledger.apply_effect(EffectKind::Attack, 25.0, 5.0, 1.0),
            EffectOutcome::Replaced
        );

        let attacks: Vec<_> = ledger
            .effects()
            .iter()
            .filter(|effect| effect.kind == EffectKind::Attack)
            .collect();
        assert_eq!(attacks.len(), 1);
        assert!(approx(attacks[0].magnitude, 25.0));
    }

    #[test]
    fn test_stack_cap_reports_not_applied() {
        let config = LedgerConfig {
            max_stacks: 2,
            ..LedgerConfig::default()
        };
        let mut ledger = StatusLedger::new(100.0, config);
        ledger.apply_effect(EffectKind::Flux, 10.0, 5.0, 0.0);
        ledger.apply_effect(EffectKind::Flux, 10.0, 5.0, 0.0);

        assert_eq!(
            ledger.apply_effect(EffectKind::Flux, 10.0, 5.0, 0.0),
            EffectOutcome::StackCapped
        );
        assert!(approx(ledger.aggregate_modifier(EffectKind::Flux, 0.0), 20.0));
    }

    #[test]
    fn test_tick_is_idempotent() {
        let mut ledger = ledger(100.0);
        ledger.apply_effect(EffectKind::Swiftness, 10.0, 1.0, 0.0);
        ledger.apply_effect(EffectKind::Vitality, 10.0, 3.0, 0.0);

        let first = ledger.tick(1.0);
        let second = ledger.tick(1.0);

        assert_eq!(first.expired, vec![EffectKind::Swiftness]);
        assert!(second.expired.is_empty());
        assert_eq!(ledger.effects().len(), 1);
    }

    #[test]
    fn test_durability_rescales_health_and_shield() {
        let mut ledger = ledger(100.0);
        ledger.apply_damage(50.0, 0.0);
        ledger.apply_shield(20.0, None);

        ledger.apply_effect(EffectKind::Durability, 100.0, 10.0, 0.0);
        assert!(approx(ledger.max_health(), 200.0));
        assert!(approx(ledger.health(), 100.0));
        assert!(approx(ledger.shield(), 40.0));

        ledger.tick(10.0);
        assert!(approx(ledger.max_health(), 100.0));
        assert!(approx(ledger.health(), 50.0));
        assert!(approx(ledger.shield(), 20.0));
    }

    #[test]
    fn test_capped_shield_stops_at_cap() {
        let mut ledger = ledger(100.0);
        let mut total = 0.0;
        for _ in 0..10 {
            total += ledger.apply_shield(5.0, Some(33.0)).granted;
        }
        assert!(approx(total, 33.0));
        assert!(ledger.apply_shield(5.0, Some(33.0)).capped);

        // Uncapped sources may still fill the pool.
        let grant = ledger.apply_shield(100.0, None);
        assert!(approx(grant.granted, 67.0));
        assert!(approx(ledger.shield(), ledger.max_shield()));
    }

    #[test]
    fn test_shield_damage_reopens_cap_room() {
        let mut ledger = ledger(100.0);
        ledger.apply_shield(33.0, Some(33.0));
        ledger.apply_damage(20.0, 0.0);

        assert!(approx(ledger.capped_shield_total(), 13.0));
        assert!(approx(ledger.apply_shield(30.0, Some(33.0)).granted, 20.0));
    }

    #[test]
    fn test_regen_waits_for_quiet_period() {
        let mut ledger = ledger(100.0);
        ledger.apply_damage(10.0, 0.0);

        ledger.tick(2.0);
        assert!(approx(ledger.health(), 90.0));

        // Eligible at 3.0, first pulse one interval later.
        ledger.tick(3.0);
        assert!(approx(ledger.health(), 90.0));
        let report = ledger.tick(3.5);
        assert!(approx(report.regenerated, 2.0));
        assert!(approx(ledger.health(), 92.0));

        // New damage cancels the cycle.
        ledger.apply_damage(1.0, 3.75);
        ledger.tick(4.5);
        assert!(approx(ledger.health(), 91.0));
    }

    #[test]
    fn test_regen_scales_with_vitality_and_stops_at_full() {
        let mut ledger = ledger(100.0);
        ledger.apply_damage(3.0, 0.0);
        ledger.apply_effect(EffectKind::Vitality, 50.0, 60.0, 0.0);

        ledger.tick(3.0);
        let report = ledger.tick(3.5);
        assert!(approx(report.regenerated, 3.0));
        assert!(approx(ledger.health(), 100.0));
        assert!(approx(ledger.tick(10.0).regenerated, 0.0));
    }

    #[test]
    fn test_burning_bypasses_shield() {
        let mut ledger = ledger(100.0);
        ledger.apply_shield(50.0, None);
        ledger.apply_burning(4.0, 1.0, 0.0);

        let report = ledger.tick(1.0);
        assert!(approx(report.burn_damage, 8.0));
        assert!(approx(ledger.health(), 92.0));
        assert!(approx(ledger.shield(), 50.0));
        assert!(report.expired.contains(&EffectKind::Burning));
    }

    #[test]
    fn test_burning_extension_keeps_tick_phase() {
        let mut ledger = ledger(100.0);
        ledger.apply_burning(2.0, 1.0, 0.0);
        ledger.tick(0.75);
        assert!(approx(ledger.health(), 98.0));

        // 0.25 remaining + 1.0 new, next tick still due at 1.0.
        assert_eq!(ledger.apply_burning(2.0, 1.0, 0.75), EffectOutcome::Extended);
        let burning = ledger
            .effects()
            .iter()
            .find(|effect| effect.kind == EffectKind::Burning)
            .map(ActiveEffect::end);
        assert_eq!(burning, Some(2.0));

        ledger.tick(1.0);
        assert!(approx(ledger.health(), 96.0));
        ledger.tick(2.0);
        assert!(approx(ledger.health(), 92.0));
    }

    #[test]
    fn test_lapsed_burning_restarts_fresh() {
        let mut ledger = ledger(100.0);
        ledger.apply_burning(2.0, 1.0, 0.0);

        // Long over, but never swept by a tick.
        assert_eq!(ledger.apply_burning(2.0, 1.0, 5.0), EffectOutcome::Added);
        let report = ledger.tick(5.0);
        assert!(approx(report.burn_damage, 0.0));
        assert!(approx(ledger.health(), 100.0));

        let report = ledger.tick(5.5);
        assert!(approx(report.burn_damage, 2.0));
        let report = ledger.tick(6.0);
        assert!(approx(report.burn_damage, 2.0));
        assert!(report.expired.contains(&EffectKind::Burning));
        assert!(approx(ledger.health(), 96.0));
    }

    #[test]
    fn test_reset_restores_spawn_state() {
        let mut ledger = ledger(100.0);
        ledger.apply_shield(10.0, None);
        ledger.apply_effect(EffectKind::Durability, 20.0, 30.0, 0.0);
        ledger.apply_damage(500.0, 1.0);
        assert!(ledger.is_dead());

        ledger.reset();
        assert!(!ledger.is_dead());
        assert!(approx(ledger.health(), 100.0));
        assert!(approx(ledger.max_health(), 100.0));
        assert!(approx(ledger.shield(), 0.0));
        assert!(ledger.effects().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Damage(f32),
        Heal(f32),
        Shield(f32, Option<f32>),
        Effect(usize, f32, f64),
        Burn(f32, f64),
        Advance(f64),
    }

    const KINDS: [EffectKind; 6] = [
        EffectKind::Attack,
        EffectKind::Durability,
        EffectKind::Strength,
        EffectKind::Vitality,
        EffectKind::Flux,
        EffectKind::Swiftness,
    ];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..150.0).prop_map(Op::Damage),
            (0.0f32..80.0).prop_map(Op::Heal),
            (0.0f32..120.0, proptest::option::of(0.0f32..100.0))
                .prop_map(|(amount, cap)| Op::Shield(amount, cap)),
            (0usize..KINDS.len(), 0.0f32..60.0, 0.0f64..12.0)
                .prop_map(|(kind, magnitude, duration)| Op::Effect(kind, magnitude, duration)),
            (0.0f32..10.0, 0.0f64..4.0).prop_map(|(damage, duration)| Op::Burn(damage, duration)),
            (0.0f64..3.0).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #[test]
        fn test_health_and_shield_stay_in_bounds(ops in proptest::collection::vec(op(), 1..64)) {
            let mut ledger = ledger(100.0);
            let mut now = 0.0;

            for op in ops {
                match op {
                    Op::Damage(amount) => { ledger.apply_damage(amount, now); },
                    Op::Heal(amount) => { ledger.heal(amount); },
                    Op::Shield(amount, cap) => { ledger.apply_shield(amount, cap); },
                    Op::Effect(kind, magnitude, duration) => {
                        ledger.apply_effect(KINDS[kind], magnitude, duration, now);
                    },
                    Op::Burn(damage, duration) => { ledger.apply_burning(damage, duration, now); },
                    Op::Advance(dt) => {
                        now += dt;
                        ledger.tick(now);
                        prop_assert!(ledger.effects().iter().all(|effect| !effect.is_expired(now)));
                    },
                }

                prop_assert!(ledger.health() >= 0.0);
                prop_assert!(ledger.health() <= ledger.max_health());
                prop_assert!(ledger.shield() >= 0.0);
                prop_assert!(ledger.shield() <= ledger.max_shield());
            }
        }
    }
}
