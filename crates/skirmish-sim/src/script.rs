//! Scripted player input.
//!
//! A script is a looping timeline of cues. Each cue holds a set of logical
//! actions down for a while; an [`InputTracker`] turns the held set into
//! frames with press and release edges.

use glam::Vec2;
use skirmish_combat::input::{InputFrame, InputTracker, LogicalAction};

/// Actions held down from `at` for `hold` seconds within one loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Offset into the loop, in seconds.
    pub at: f64,
    /// How long the actions stay down.
    pub hold: f64,
    /// Actions held.
    pub actions: Vec<LogicalAction>,
}

impl Cue {
    fn new(at: f64, hold: f64, actions: &[LogicalAction]) -> Self {
        Self {
            at,
            hold,
            actions: actions.to_vec(),
        }
    }

    fn is_active(&self, offset: f64) -> bool {
        offset >= self.at && offset < self.at + self.hold
    }
}

/// Looping input timeline for one player.
#[derive(Debug, Clone)]
pub struct InputScript {
    cues: Vec<Cue>,
    period: f64,
    tracker: InputTracker,
}

impl InputScript {
    /// Create a script from cues repeating every `period` seconds.
    #[must_use]
    pub fn new(cues: Vec<Cue>, period: f64) -> Self {
        Self {
            cues,
            period: period.max(0.1),
            tracker: InputTracker::new(),
        }
    }

    /// The duel loop: a full blade combo, a charged volley, a seeker with
    /// one redirect, then a summon.
    #[must_use]
    pub fn duel() -> Self {
        use LogicalAction::{ComboModifier, PrimaryAttack, SecondaryAttack};

        let tap = 0.05;
        Self::new(
            vec![
                Cue::new(0.0, tap, &[PrimaryAttack]),
                Cue::new(0.2, tap, &[PrimaryAttack]),
                Cue::new(0.4, tap, &[PrimaryAttack]),
                Cue::new(1.0, 1.3, &[SecondaryAttack]),
                Cue::new(3.0, tap, &[ComboModifier, PrimaryAttack]),
                Cue::new(3.4, tap, &[ComboModifier, PrimaryAttack]),
                Cue::new(4.2, tap, &[ComboModifier, SecondaryAttack]),
            ],
            6.0,
        )
    }

    /// Actions held at simulation time `now`.
    #[must_use]
    pub fn held_at(&self, now: f64) -> Vec<LogicalAction> {
        let offset = now.rem_euclid(self.period);
        let mut held = Vec::new();
        for cue in self.cues.iter().filter(|cue| cue.is_active(offset)) {
            for action in &cue.actions {
                if !held.contains(action) {
                    held.push(*action);
                }
            }
        }
        held
    }

    /// Samples the frame for `now`, aiming at `aim_point`.
    pub fn frame(&mut self, now: f64, aim_point: Vec2) -> InputFrame {
        let held = self.held_at(now);
        self.tracker.sample(&held, aim_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_at_loops() {
        let script = InputScript::duel();
        assert_eq!(script.held_at(0.01), vec![LogicalAction::PrimaryAttack]);
        assert_eq!(script.held_at(6.01), vec![LogicalAction::PrimaryAttack]);
        assert!(script.held_at(0.1).is_empty());
        assert_eq!(script.held_at(2.0), vec![LogicalAction::SecondaryAttack]);
    }

    #[test]
    fn test_frames_carry_edges() {
        let mut script = InputScript::new(vec![Cue::new(0.0, 0.05, &[LogicalAction::PrimaryAttack])], 1.0);
        let aim = Vec2::new(1.0, 0.0);

        let first = script.frame(0.0, aim);
        assert!(first.pressed(LogicalAction::PrimaryAttack));

        let second = script.frame(0.02, aim);
        assert!(second.held(LogicalAction::PrimaryAttack));
        assert!(!second.pressed(LogicalAction::PrimaryAttack));

        let third = script.frame(0.06, aim);
        assert!(third.released(LogicalAction::PrimaryAttack));
    }

    #[test]
    fn test_modifier_and_attack_press_together() {
        let mut script = InputScript::duel();
        let frame = script.frame(3.0, Vec2::ZERO);
        assert!(frame.held(LogicalAction::ComboModifier));
        assert!(frame.pressed(LogicalAction::PrimaryAttack));
    }
}
