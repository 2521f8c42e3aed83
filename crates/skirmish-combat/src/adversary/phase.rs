//! Adversary phases and their legal transitions.

use serde::{Deserialize, Serialize};
use skirmish_common::{CombatError, CombatResult};
use std::fmt;

/// Stage of the aerial attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AerialStage {
    /// Climbing, then relocating beside the target.
    Rising,
    /// Flying across the target. Passes count from 1.
    Passing {
        /// Current pass
        pass: u32,
    },
    /// Coming back down.
    Landing,
}

/// What an adversary is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdversaryPhase {
    /// No target in range.
    Idle,
    /// Closing in on a target.
    Chasing,
    /// Close-range attack in progress.
    Melee,
    /// Projectile attack in progress.
    Ranged,
    /// Multi-phase aerial attack in progress.
    Aerial(AerialStage),
    /// Dead until respawned.
    Dead,
}

impl AdversaryPhase {
    /// Get display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Chasing => "Chasing",
            Self::Melee => "Melee",
            Self::Ranged => "Ranged",
            Self::Aerial(AerialStage::Rising) => "Aerial-Rising",
            Self::Aerial(AerialStage::Passing { .. }) => "Aerial-Passing",
            Self::Aerial(AerialStage::Landing) => "Aerial-Landing",
            Self::Dead => "Dead",
        }
    }

    /// Whether an attack is in progress.
    #[must_use]
    pub fn is_attacking(self) -> bool {
        matches!(self, Self::Melee | Self::Ranged | Self::Aerial(_))
    }

    /// Whether the transition table allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use AerialStage::{Landing, Passing, Rising};

        match (self, next) {
            // Fatal damage interrupts anything.
            (_, Self::Dead) => true,
            (Self::Dead, next) => next == Self::Idle,
            (Self::Idle | Self::Chasing, next) => matches!(
                next,
                Self::Idle | Self::Chasing | Self::Melee | Self::Ranged | Self::Aerial(Rising)
            ),
            (Self::Melee | Self::Ranged, next) => matches!(next, Self::Idle | Self::Chasing),
            (Self::Aerial(Rising), Self::Aerial(Passing { pass })) => pass == 1,
            (Self::Aerial(Passing { pass }), Self::Aerial(Passing { pass: next_pass })) => {
                next_pass == pass + 1
            },
            (Self::Aerial(Passing { .. }), Self::Aerial(Landing)) => true,
            (Self::Aerial(Landing), Self::Idle) => true,
            (Self::Aerial(_), _) => false,
        }
    }

    /// Checks a transition against the table.
    pub fn check_transition(self, next: Self) -> CombatResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CombatError::IllegalTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for AdversaryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aerial_sequence_is_strict() {
        let rising = AdversaryPhase::Aerial(AerialStage::Rising);
        let pass1 = AdversaryPhase::Aerial(AerialStage::Passing { pass: 1 });
        let pass2 = AdversaryPhase::Aerial(AerialStage::Passing { pass: 2 });
        let landing = AdversaryPhase::Aerial(AerialStage::Landing);

        assert!(AdversaryPhase::Chasing.can_transition_to(rising));
        assert!(rising.can_transition_to(pass1));
        assert!(!rising.can_transition_to(pass2));
        assert!(!rising.can_transition_to(landing));
        assert!(pass1.can_transition_to(pass2));
        assert!(pass2.can_transition_to(landing));
        assert!(!landing.can_transition_to(AdversaryPhase::Melee));
        assert!(landing.can_transition_to(AdversaryPhase::Idle));
        assert!(!pass1.can_transition_to(AdversaryPhase::Idle));
    }

    #[test]
    fn test_dead_is_reachable_from_anywhere_and_leads_only_to_idle() {
        for phase in [
            AdversaryPhase::Idle,
            AdversaryPhase::Melee,
            AdversaryPhase::Aerial(AerialStage::Passing { pass: 3 }),
        ] {
            assert!(phase.can_transition_to(AdversaryPhase::Dead));
        }
        assert!(AdversaryPhase::Dead.can_transition_to(AdversaryPhase::Idle));
        assert!(!AdversaryPhase::Dead.can_transition_to(AdversaryPhase::Chasing));
    }

    #[test]
    fn test_illegal_transition_error() {
        let err = AdversaryPhase::Melee
            .check_transition(AdversaryPhase::Ranged)
            .expect_err("melee cannot chain into ranged");
        assert_eq!(err.to_string(), "illegal transition from Melee to Ranged");
    }
}
