//! Combat configuration.
//!
//! Every tunable of the combat core lives here: combo timing, cooldowns,
//! charge tiers, redirect budgets, regeneration, adversary range bands and
//! phase timings. Configuration can be loaded from and saved to a TOML file;
//! missing fields fall back to their defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{CombatError, CombatResult};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::signals::VisualKind;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// Root combat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Health, shield, regeneration and burning.
    pub ledger: LedgerConfig,
    /// Player body and respawn.
    pub player: PlayerConfig,
    /// Player attack sequencing.
    pub sequencer: SequencerConfig,
    /// Player projectiles and redirects.
    pub projectiles: ProjectileConfig,
    /// Allied summons.
    pub summons: SummonConfig,
    /// Boss adversary profile.
    pub boss: AdversaryConfig,
    /// Regular enemy profile.
    pub grunt: AdversaryConfig,
    /// Visual assets available to the presentation layer.
    pub visuals: VisualConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            player: PlayerConfig::default(),
            sequencer: SequencerConfig::default(),
            projectiles: ProjectileConfig::default(),
            summons: SummonConfig::default(),
            boss: AdversaryConfig::boss(),
            grunt: AdversaryConfig::grunt(),
            visuals: VisualConfig::default(),
        }
    }
}

impl CombatConfig {
    /// Load configuration from the default file in the working directory.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config {}: {e}, using defaults", path.display());
                return Self::default();
            },
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => {
                info!("Loaded combat config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Invalid config {}: {e}, using defaults", path.display());
                Self::default()
            },
        }
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(contents: &str) -> CombatResult<Self> {
        let mut config: Self =
            toml::from_str(contents).map_err(|e| CombatError::Config(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> CombatResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| CombatError::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Clamp out-of-range values to safe ones.
    pub fn validate(&mut self) {
        self.ledger.validate();
        self.player.max_health = self.player.max_health.max(1.0);
        self.player.respawn_delay = self.player.respawn_delay.max(0.0);
        self.sequencer.validate();
        self.projectiles.validate();
        self.summons.health = self.summons.health.max(1.0);
        self.summons.lifetime = self.summons.lifetime.max(0.1);
        self.summons.strike_interval = self.summons.strike_interval.max(0.05);
        self.boss.validate();
        self.grunt.validate();
    }
}

/// Health, shield, regeneration and burning tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Seconds without damage before health starts regenerating.
    pub regen_delay: f64,
    /// Health restored per regen interval before Vitality.
    pub regen_rate: f32,
    /// Seconds between regen pulses.
    pub regen_interval: f64,
    /// Seconds between burning damage ticks.
    pub burn_interval: f64,
    /// Live instances of one stacking effect kind an actor may carry.
    pub max_stacks: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            regen_delay: 3.0,
            regen_rate: 2.0,
            regen_interval: 0.5,
            burn_interval: 0.5,
            max_stacks: 10,
        }
    }
}

impl LedgerConfig {
    fn validate(&mut self) {
        self.regen_delay = self.regen_delay.max(0.0);
        self.regen_rate = self.regen_rate.max(0.0);
        self.regen_interval = self.regen_interval.max(0.01);
        self.burn_interval = self.burn_interval.max(0.01);
        self.max_stacks = self.max_stacks.max(1);
    }
}

/// Player body tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base maximum health.
    pub max_health: f32,
    /// Half extents of the player's hurtbox.
    pub hitbox: Vec2,
    /// Seconds between death and respawn.
    pub respawn_delay: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            hitbox: Vec2::new(0.4, 0.9),
            respawn_delay: 3.0,
        }
    }
}

/// Timing and damage of one player action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Base damage dealt by the action's zone or projectile.
    pub damage: f32,
    /// Seconds before the action can be used again.
    pub cooldown: f64,
    /// Seconds between the animation starting and the effect landing.
    pub windup: f64,
    /// Seconds after the effect before the next queued action starts.
    pub recovery: f64,
    /// Attack type passed to the animation collaborator.
    pub animation: u8,
    /// Distance from the actor to the zone center.
    pub reach: f32,
    /// Half extents of the spawned zone.
    pub zone_extents: Vec2,
    /// Lifetime of the spawned zone in seconds.
    pub zone_duration: f64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            damage: 10.0,
            cooldown: 0.3,
            windup: 0.1,
            recovery: 0.1,
            animation: 0,
            reach: 1.0,
            zone_extents: Vec2::new(0.8, 0.6),
            zone_duration: 0.15,
        }
    }
}

/// Attack sequencer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Seconds after the first click during which clicks escalate the combo.
    pub combo_window: f64,
    /// Base primary action.
    pub slash: ActionConfig,
    /// Second-click escalation.
    pub aegis_surge: ActionConfig,
    /// Third-click escalation.
    pub cleave: ActionConfig,
    /// Charged secondary action.
    pub volley: ActionConfig,
    /// Redirectable projectile action.
    pub seeker: ActionConfig,
    /// Summon action.
    pub summon: ActionConfig,
    /// Upper bounds (seconds held) of charge tiers 1, 2 and 3.
    pub charge_bounds: [f64; 3],
    /// Aegis granted by the surge, as a percentage of max health.
    pub aegis_percent: f32,
    /// Cap on shield added by capped sources, as a percentage of max health.
    pub aegis_cap_percent: f32,
    /// Flat Durability granted by the surge.
    pub durability_bonus: f32,
    /// Seconds the surge's Durability lasts.
    pub durability_duration: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            combo_window: 0.6,
            slash: ActionConfig {
                damage: 12.0,
                cooldown: 0.25,
                windup: 0.08,
                recovery: 0.12,
                animation: 1,
                ..ActionConfig::default()
            },
            aegis_surge: ActionConfig {
                damage: 0.0,
                cooldown: 4.0,
                windup: 0.05,
                recovery: 0.1,
                animation: 2,
                ..ActionConfig::default()
            },
            cleave: ActionConfig {
                damage: 30.0,
                cooldown: 1.5,
                windup: 0.2,
                recovery: 0.3,
                animation: 3,
                reach: 1.4,
                zone_extents: Vec2::new(1.6, 0.9),
                zone_duration: 0.25,
            },
            volley: ActionConfig {
                damage: 8.0,
                cooldown: 0.8,
                windup: 0.05,
                recovery: 0.15,
                animation: 4,
                ..ActionConfig::default()
            },
            seeker: ActionConfig {
                damage: 15.0,
                cooldown: 1.0,
                windup: 0.05,
                recovery: 0.1,
                animation: 5,
                ..ActionConfig::default()
            },
            summon: ActionConfig {
                damage: 0.0,
                cooldown: 2.0,
                windup: 0.3,
                recovery: 0.2,
                animation: 6,
                ..ActionConfig::default()
            },
            charge_bounds: [0.5, 0.8, 1.2],
            aegis_percent: 5.0,
            aegis_cap_percent: 33.0,
            durability_bonus: 5.0,
            durability_duration: 10.0,
        }
    }
}

impl SequencerConfig {
    fn validate(&mut self) {
        self.combo_window = self.combo_window.max(0.0);
        for action in [
            &mut self.slash,
            &mut self.aegis_surge,
            &mut self.cleave,
            &mut self.volley,
            &mut self.seeker,
            &mut self.summon,
        ] {
            action.cooldown = action.cooldown.max(0.0);
            action.windup = action.windup.max(0.0);
            action.recovery = action.recovery.max(0.0);
            action.damage = action.damage.max(0.0);
        }
        // Tier bounds must be ascending for bucketing to be meaningful.
        let mut bounds = self.charge_bounds;
        for i in 1..bounds.len() {
            if bounds[i] < bounds[i - 1] {
                warn!("charge bounds out of order, clamping {}", bounds[i]);
                bounds[i] = bounds[i - 1];
            }
        }
        self.charge_bounds = bounds;
        self.aegis_cap_percent = self.aegis_cap_percent.clamp(0.0, 100.0);
    }
}

/// Player projectile tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Seconds a projectile stays in flight.
    pub lifetime: f64,
    /// Distance at which a projectile strikes an actor.
    pub hit_radius: f32,
    /// Redirects a seeker may perform.
    pub redirect_budget: u32,
    /// Radius around the projectile searched for a new target.
    pub redirect_radius: f32,
    /// Seconds added to the governing cooldown per redirect.
    pub redirect_extension: f64,
    /// Projectiles fired per charge tier.
    pub volley_counts: [u32; 4],
    /// Damage per projectile per charge tier.
    pub volley_damage: [f32; 4],
    /// Angle between volley projectiles in radians.
    pub volley_spread: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            lifetime: 3.0,
            hit_radius: 0.6,
            redirect_budget: 5,
            redirect_radius: 8.0,
            redirect_extension: 0.5,
            volley_counts: [1, 2, 3, 4],
            volley_damage: [8.0, 10.0, 12.0, 15.0],
            volley_spread: 0.15,
        }
    }
}

impl ProjectileConfig {
    fn validate(&mut self) {
        self.speed = self.speed.max(0.1);
        self.lifetime = self.lifetime.max(0.1);
        self.hit_radius = self.hit_radius.max(0.01);
        self.redirect_radius = self.redirect_radius.max(0.0);
        self.redirect_extension = self.redirect_extension.max(0.0);
    }
}

/// Allied summon tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonConfig {
    /// Live summons a player may have at once.
    pub max_concurrent: usize,
    /// Seconds a summon lives.
    pub lifetime: f64,
    /// Summon maximum health.
    pub health: f32,
    /// Spawn offset from the player.
    pub offset: Vec2,
    /// Half extents of a summon's hurtbox.
    pub hitbox: Vec2,
    /// Radius within which a summon notices hostiles.
    pub detection_radius: f32,
    /// Movement speed toward the nearest hostile.
    pub move_speed: f32,
    /// Damage of one strike.
    pub strike_damage: f32,
    /// Seconds between strikes.
    pub strike_interval: f64,
    /// Distance at which a summon strikes.
    pub strike_range: f32,
}

impl Default for SummonConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            lifetime: 8.0,
            health: 40.0,
            offset: Vec2::new(1.5, 0.0),
            hitbox: Vec2::new(0.4, 0.6),
            detection_radius: 10.0,
            move_speed: 3.0,
            strike_damage: 6.0,
            strike_interval: 1.0,
            strike_range: 1.2,
        }
    }
}

/// One ground attack of an adversary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackBand {
    /// Minimum distance to the target for this attack.
    pub min_range: f32,
    /// Maximum distance to the target for this attack.
    pub max_range: f32,
    /// Seconds before the attack can be used again.
    pub cooldown: f64,
    /// Damage per hit.
    pub damage: f32,
    /// Seconds between the animation starting and the hit.
    pub windup: f64,
    /// Seconds after the hit before the adversary acts again.
    pub recovery: f64,
    /// Attack type passed to the animation collaborator.
    pub animation: u8,
}

impl Default for AttackBand {
    fn default() -> Self {
        Self {
            min_range: 0.0,
            max_range: 2.0,
            cooldown: 1.5,
            damage: 10.0,
            windup: 0.4,
            recovery: 0.4,
            animation: 1,
        }
    }
}

impl AttackBand {
    /// Whether `distance` falls inside this band.
    #[must_use]
    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }
}

/// Aerial attack tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialConfig {
    /// Whether this profile uses the aerial attack at all.
    pub enabled: bool,
    /// Distance band and cooldown that gate the attack.
    pub band: AttackBand,
    /// Height gained while rising.
    pub rise_height: f32,
    /// Seconds the ascent takes.
    pub rise_duration: f64,
    /// Horizontal distance from the target at which each pass starts and ends.
    pub pass_offset: f32,
    /// Horizontal speed while passing.
    pub pass_speed: f32,
    /// Half width of the band beneath the flight path that triggers a burst.
    pub burst_band: f32,
    /// Half extents of the burst zone.
    pub burst_extents: Vec2,
    /// Burning damage per tick set on actors the burst hits.
    pub burn_per_tick: f32,
    /// Seconds the burst's burning lasts.
    pub burn_duration: f64,
    /// Passes flown before any health-threshold latch.
    pub base_passes: u32,
    /// Seconds to wait for a ground report before landing anyway.
    pub landing_timeout: f64,
}

impl Default for AerialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band: AttackBand {
                min_range: 3.0,
                max_range: 12.0,
                cooldown: 8.0,
                damage: 25.0,
                windup: 0.0,
                recovery: 0.5,
                animation: 3,
            },
            rise_height: 5.0,
            rise_duration: 0.6,
            pass_offset: 6.0,
            pass_speed: 12.0,
            burst_band: 1.0,
            burst_extents: Vec2::new(1.0, 3.0),
            burn_per_tick: 3.0,
            burn_duration: 2.0,
            base_passes: 1,
            landing_timeout: 1.5,
        }
    }
}

/// Adversary profile: detection, attack bands, latches and respawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdversaryConfig {
    /// Maximum health.
    pub max_health: f32,
    /// Half extents of the hurtbox.
    pub hitbox: Vec2,
    /// Radius within which players and summons are noticed.
    pub detection_radius: f32,
    /// Chase speed in world units per second.
    pub move_speed: f32,
    /// Close-range attack.
    pub melee: AttackBand,
    /// Projectile attack.
    pub ranged: AttackBand,
    /// Multi-phase aerial attack.
    pub aerial: AerialConfig,
    /// Health fraction at or below which the first pass latch engages.
    pub first_threshold: f32,
    /// Health fraction at or below which the second pass latch engages.
    pub second_threshold: f32,
    /// Strength percent gained each time a threshold latches.
    pub enrage_strength: f32,
    /// Seconds each enrage lasts.
    pub enrage_duration: f64,
    /// Seconds between death and respawn.
    pub respawn_delay: f64,
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self::boss()
    }
}

impl AdversaryConfig {
    /// Default boss profile.
    #[must_use]
    pub fn boss() -> Self {
        Self {
            max_health: 500.0,
            hitbox: Vec2::new(1.0, 1.5),
            detection_radius: 15.0,
            move_speed: 3.0,
            melee: AttackBand {
                damage: 20.0,
                ..AttackBand::default()
            },
            ranged: AttackBand {
                min_range: 4.0,
                max_range: 10.0,
                cooldown: 3.0,
                damage: 12.0,
                windup: 0.5,
                recovery: 0.3,
                animation: 2,
            },
            aerial: AerialConfig::default(),
            first_threshold: 0.5,
            second_threshold: 0.25,
            enrage_strength: 15.0,
            enrage_duration: 20.0,
            respawn_delay: 5.0,
        }
    }

    /// Default grunt profile: no aerial attack, weaker hits.
    #[must_use]
    pub fn grunt() -> Self {
        Self {
            max_health: 60.0,
            hitbox: Vec2::new(0.5, 0.8),
            detection_radius: 10.0,
            move_speed: 2.5,
            melee: AttackBand {
                damage: 8.0,
                cooldown: 1.2,
                ..AttackBand::default()
            },
            ranged: AttackBand {
                min_range: 3.0,
                max_range: 7.0,
                cooldown: 4.0,
                damage: 5.0,
                windup: 0.6,
                recovery: 0.3,
                animation: 2,
            },
            aerial: AerialConfig {
                enabled: false,
                ..AerialConfig::default()
            },
            first_threshold: 0.5,
            second_threshold: 0.25,
            enrage_strength: 0.0,
            enrage_duration: 0.0,
            respawn_delay: 4.0,
        }
    }

    fn validate(&mut self) {
        self.max_health = self.max_health.max(1.0);
        self.detection_radius = self.detection_radius.max(0.0);
        self.move_speed = self.move_speed.max(0.0);
        self.first_threshold = self.first_threshold.clamp(0.0, 1.0);
        self.second_threshold = self.second_threshold.clamp(0.0, self.first_threshold);
        self.respawn_delay = self.respawn_delay.max(0.0);
        self.enrage_strength = self.enrage_strength.max(0.0);
        self.enrage_duration = self.enrage_duration.max(0.0);
        self.aerial.burn_per_tick = self.aerial.burn_per_tick.max(0.0);
        self.aerial.burn_duration = self.aerial.burn_duration.max(0.0);
        self.aerial.rise_duration = self.aerial.rise_duration.max(0.0);
        self.aerial.pass_speed = self.aerial.pass_speed.max(0.1);
        self.aerial.landing_timeout = self.aerial.landing_timeout.max(0.0);
    }
}

/// Visual assets the presentation layer can show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Visual kinds with an asset behind them.
    pub available: Vec<VisualKind>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            available: VisualKind::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = CombatConfig::default();
        assert_eq!(config.projectiles.redirect_budget, 5);
        assert_eq!(config.sequencer.charge_bounds, [0.5, 0.8, 1.2]);
        assert!((config.sequencer.aegis_cap_percent - 33.0).abs() < f32::EPSILON);
        assert_eq!(config.boss.aerial.base_passes, 1);
        assert!(!config.grunt.aerial.enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CombatConfig::from_toml_str(
            r#"
            [sequencer]
            combo_window = 0.9

            [boss]
            max_health = 800.0
            "#,
        )
        .expect("valid toml");

        assert!((config.sequencer.combo_window - 0.9).abs() < 1e-9);
        assert!((config.boss.max_health - 800.0).abs() < f32::EPSILON);
        assert_eq!(config.sequencer.slash, SequencerConfig::default().slash);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = CombatConfig::from_toml_str("sequencer = 3");
        assert!(matches!(result, Err(CombatError::Config(_))));
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = CombatConfig::default();
        config.sequencer.charge_bounds = [0.5, 0.2, 1.0];
        config.boss.second_threshold = 0.9;
        config.ledger.regen_interval = 0.0;
        config.validate();

        assert_eq!(config.sequencer.charge_bounds, [0.5, 0.5, 1.0]);
        assert!(config.boss.second_threshold <= config.boss.first_threshold);
        assert!(config.ledger.regen_interval > 0.0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);

        let mut config = CombatConfig::default();
        config.summons.max_concurrent = 4;
        config.save_to(&path).expect("save");

        let loaded = CombatConfig::load_from(&path);
        assert_eq!(loaded.summons.max_concurrent, 4);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = CombatConfig::load_from(dir.path().join("absent.toml"));
        assert_eq!(loaded, CombatConfig::default());
    }
}
