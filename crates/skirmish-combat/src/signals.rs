//! Output signals for presentation collaborators.
//!
//! The combat core never renders or plays anything itself. It publishes
//! fire-and-forget [`CombatSignal`]s on a bounded channel that the animation,
//! VFX and UI layers drain once per frame.

use ahash::AHashSet;
use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::EntityId;
use tracing::warn;

/// Visual effects the core may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    /// Blade arc of a basic slash.
    SlashArc,
    /// Shield burst of the aegis surge.
    AegisBurst,
    /// Wide wave of a cleave.
    CleaveWave,
    /// Flash when a charged volley is released.
    ChargeFlash,
    /// Trail left by a seeker when it changes course.
    SeekerTrail,
    /// Portal a summon steps out of.
    SummonPortal,
    /// Burst dropped by a boss during an aerial pass.
    AerialBurst,
    /// Puff on death.
    DeathPuff,
    /// Glow on respawn.
    RespawnGlow,
}

impl VisualKind {
    /// Every visual kind.
    pub const ALL: [Self; 9] = [
        Self::SlashArc,
        Self::AegisBurst,
        Self::CleaveWave,
        Self::ChargeFlash,
        Self::SeekerTrail,
        Self::SummonPortal,
        Self::AerialBurst,
        Self::DeathPuff,
        Self::RespawnGlow,
    ];
}

/// Signals published to external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatSignal {
    /// Play attack animation `attack` on `actor` for `duration` seconds.
    PlayAttackAnimation {
        /// Animated actor
        actor: EntityId,
        /// Attack type index
        attack: u8,
        /// Animation length in seconds
        duration: f64,
    },
    /// Spawn a visual effect at a world position.
    SpawnVisualEffect {
        /// Effect to spawn
        kind: VisualKind,
        /// World position
        position: Vec2,
    },
    /// Show a floating damage number.
    ShowDamageNumber {
        /// Damaged actor
        target: EntityId,
        /// Damage taken (shield and health combined)
        amount: f32,
        /// World position
        position: Vec2,
    },
    /// An actor died.
    ActorDied {
        /// Dead actor
        entity: EntityId,
    },
    /// An actor came back after dying.
    ActorRespawned {
        /// Respawned actor
        entity: EntityId,
    },
}

/// Bounded bus carrying [`CombatSignal`]s to their consumers.
#[derive(Debug)]
pub struct SignalBus {
    /// Sender for publishing signals
    sender: Sender<CombatSignal>,
    /// Receiver for draining signals
    receiver: Receiver<CombatSignal>,
    /// Channel capacity
    capacity: usize,
    /// Visual kinds with an asset behind them
    available: AHashSet<VisualKind>,
    /// Missing visual kinds already reported
    reported_missing: AHashSet<VisualKind>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new(1024, &VisualKind::ALL)
    }
}

impl SignalBus {
    /// Creates a bus with the given capacity and the set of available visuals.
    #[must_use]
    pub fn new(capacity: usize, available: &[VisualKind]) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            available: available.iter().copied().collect(),
            reported_missing: AHashSet::new(),
        }
    }

    /// Publishes a signal. Signals are dropped when the bus is full.
    pub fn publish(&self, signal: CombatSignal) {
        let _ = self.sender.try_send(signal);
    }

    /// Asks for an attack animation.
    pub fn play_attack(&self, actor: EntityId, attack: u8, duration: f64) {
        self.publish(CombatSignal::PlayAttackAnimation {
            actor,
            attack,
            duration,
        });
    }

    /// Asks for a damage number.
    pub fn damage_number(&self, target: EntityId, amount: f32, position: Vec2) {
        if amount > 0.0 {
            self.publish(CombatSignal::ShowDamageNumber {
                target,
                amount,
                position,
            });
        }
    }

    /// Asks for a visual effect.
    ///
    /// A kind without an asset is reported once and then skipped; the
    /// gameplay effect that triggered it is unaffected.
    pub fn spawn_visual(&mut self, kind: VisualKind, position: Vec2) {
        if !self.available.contains(&kind) {
            if self.reported_missing.insert(kind) {
                warn!("no asset for visual {kind:?}, showing nothing");
            }
            return;
        }
        self.publish(CombatSignal::SpawnVisualEffect { kind, position });
    }

    /// Drains all pending signals.
    pub fn drain(&self) -> Vec<CombatSignal> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending signals.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new receiver handle for an external consumer.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<CombatSignal> {
        self.receiver.clone()
    }
}
