//! Player action catalogue.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{ActionConfig, SequencerConfig};

/// Family an action belongs to. Escalations chain inside their family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionFamily {
    /// Primary melee combo.
    Blade,
    /// Charged secondary.
    Volley,
    /// Redirectable projectile.
    Seeker,
    /// Allied summon.
    Summon,
}

/// Actions the sequencer can queue. Each owns its own cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Short melee zone toward the aim point.
    Slash,
    /// Second-click escalation: Durability, then Aegis.
    AegisSurge,
    /// Third-click escalation: wide heavy zone. Uninterruptible.
    Cleave,
    /// Released charge: one to four projectiles.
    ChargedVolley,
    /// Redirectable projectile.
    SeekerBolt,
    /// Timed allied summon.
    SummonAlly,
}

impl ActionKind {
    /// Family of this action.
    #[must_use]
    pub const fn family(self) -> ActionFamily {
        match self {
            Self::Slash | Self::AegisSurge | Self::Cleave => ActionFamily::Blade,
            Self::ChargedVolley => ActionFamily::Volley,
            Self::SeekerBolt => ActionFamily::Seeker,
            Self::SummonAlly => ActionFamily::Summon,
        }
    }

    /// Whether this action is a combo escalation rather than a base action.
    #[must_use]
    pub const fn is_escalation(self) -> bool {
        matches!(self, Self::AegisSurge | Self::Cleave)
    }

    /// Whether this action blocks new base actions until it finishes.
    #[must_use]
    pub const fn is_uninterruptible(self) -> bool {
        matches!(self, Self::Cleave)
    }

    /// Escalation for the given click count inside a combo window.
    #[must_use]
    pub const fn escalation_for_click(click: u32) -> Option<Self> {
        match click {
            2 => Some(Self::AegisSurge),
            3 => Some(Self::Cleave),
            _ => None,
        }
    }

    /// Timing and damage of this action.
    #[must_use]
    pub fn config(self, config: &SequencerConfig) -> &ActionConfig {
        match self {
            Self::Slash => &config.slash,
            Self::AegisSurge => &config.aegis_surge,
            Self::Cleave => &config.cleave,
            Self::ChargedVolley => &config.volley,
            Self::SeekerBolt => &config.seeker,
            Self::SummonAlly => &config.summon,
        }
    }
}

/// An accepted action waiting for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Action to run.
    pub kind: ActionKind,
    /// Charge tier (1..=4) for charged actions, 0 otherwise.
    pub tier: u8,
    /// Aim point captured when the input arrived.
    pub aim: Vec2,
    /// Whether the cooldown check was bypassed as a forced combo link.
    pub bypassed: bool,
    /// Time the action was accepted.
    pub queued_at: f64,
}

impl QueuedAction {
    /// An uncharged action aimed at `aim`.
    #[must_use]
    pub fn new(kind: ActionKind, aim: Vec2, queued_at: f64) -> Self {
        Self {
            kind,
            tier: 0,
            aim,
            bypassed: false,
            queued_at,
        }
    }

    /// Set the charge tier.
    #[must_use]
    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    /// Mark as a forced combo link.
    #[must_use]
    pub fn with_bypass(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }
}
