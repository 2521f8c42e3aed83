//! Per-frame input for the attack sequencer.
//!
//! Raw device polling lives outside the combat core. The core consumes an
//! [`InputFrame`]: pressed/held/released booleans for each
//! [`LogicalAction`] plus an aim point in world space. [`InputTracker`]
//! derives those edges from plain "is down" samples for callers that only
//! know the held state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical actions the combat core understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalAction {
    /// Primary attack (slash combo, seeker with modifier).
    PrimaryAttack,
    /// Secondary attack (charged volley, summon with modifier).
    SecondaryAttack,
    /// Held to switch both attacks to their alternate actions.
    ComboModifier,
    /// Toggles the pause menu.
    MenuToggle,
}

impl LogicalAction {
    /// Every logical action.
    pub const ALL: [Self; 4] = [
        Self::PrimaryAttack,
        Self::SecondaryAttack,
        Self::ComboModifier,
        Self::MenuToggle,
    ];

    const fn index(self) -> usize {
        match self {
            Self::PrimaryAttack => 0,
            Self::SecondaryAttack => 1,
            Self::ComboModifier => 2,
            Self::MenuToggle => 3,
        }
    }
}

/// State of a button (held, just pressed, just released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub held: bool,
    /// Whether the button went down this frame
    pub just_pressed: bool,
    /// Whether the button came up this frame
    pub just_released: bool,
}

impl ButtonState {
    /// Create a new button state (not held).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            held: false,
            just_pressed: false,
            just_released: false,
        }
    }

    /// Update the button state from whether it is currently down.
    pub fn update(&mut self, is_down: bool) {
        self.just_pressed = is_down && !self.held;
        self.just_released = !is_down && self.held;
        self.held = is_down;
    }

    /// Clear the frame-specific edges.
    pub fn clear_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// One frame of player input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    buttons: [ButtonState; 4],
    /// Aim point in world space for targeted and projectile actions
    pub aim_point: Vec2,
}

impl InputFrame {
    /// An empty frame aimed at `aim_point`.
    #[must_use]
    pub fn new(aim_point: Vec2) -> Self {
        Self {
            buttons: [ButtonState::new(); 4],
            aim_point,
        }
    }

    /// Marks `action` as pressed this frame (and held).
    #[must_use]
    pub fn with_pressed(mut self, action: LogicalAction) -> Self {
        let button = &mut self.buttons[action.index()];
        button.held = true;
        button.just_pressed = true;
        self
    }

    /// Marks `action` as held.
    #[must_use]
    pub fn with_held(mut self, action: LogicalAction) -> Self {
        self.buttons[action.index()].held = true;
        self
    }

    /// Marks `action` as released this frame.
    #[must_use]
    pub fn with_released(mut self, action: LogicalAction) -> Self {
        let button = &mut self.buttons[action.index()];
        button.held = false;
        button.just_released = true;
        self
    }

    /// State of one action's button.
    #[must_use]
    pub fn button(&self, action: LogicalAction) -> ButtonState {
        self.buttons[action.index()]
    }

    /// Whether `action` went down this frame.
    #[must_use]
    pub fn pressed(&self, action: LogicalAction) -> bool {
        self.button(action).just_pressed
    }

    /// Whether `action` is held.
    #[must_use]
    pub fn held(&self, action: LogicalAction) -> bool {
        self.button(action).held
    }

    /// Whether `action` came up this frame.
    #[must_use]
    pub fn released(&self, action: LogicalAction) -> bool {
        self.button(action).just_released
    }
}

/// Turns held-state samples into frames with press/release edges.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    buttons: [ButtonState; 4],
}

impl InputTracker {
    /// Create a tracker with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples one frame given the set of actions currently down.
    pub fn sample(&mut self, down: &[LogicalAction], aim_point: Vec2) -> InputFrame {
        for action in LogicalAction::ALL {
            let button = &mut self.buttons[action.index()];
            button.clear_frame();
            button.update(down.contains(&action));
        }
        InputFrame {
            buttons: self.buttons,
            aim_point,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_state() {
        let mut state = ButtonState::new();
        assert!(!state.held);

        state.update(true);
        assert!(state.held);
        assert!(state.just_pressed);
        assert!(!state.just_released);

        state.clear_frame();
        state.update(true);
        assert!(state.held);
        assert!(!state.just_pressed);

        state.clear_frame();
        state.update(false);
        assert!(!state.held);
        assert!(state.just_released);
    }

    #[test]
    fn test_frame_builder() {
        let frame = InputFrame::new(Vec2::new(3.0, 1.0))
            .with_pressed(LogicalAction::PrimaryAttack)
            .with_held(LogicalAction::ComboModifier);

        assert!(frame.pressed(LogicalAction::PrimaryAttack));
        assert!(frame.held(LogicalAction::PrimaryAttack));
        assert!(frame.held(LogicalAction::ComboModifier));
        assert!(!frame.pressed(LogicalAction::ComboModifier));
        assert!(!frame.released(LogicalAction::SecondaryAttack));
        assert_eq!(frame.aim_point, Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_tracker_edges() {
        let mut tracker = InputTracker::new();
        let aim = Vec2::ZERO;

        let first = tracker.sample(&[LogicalAction::SecondaryAttack], aim);
        assert!(first.pressed(LogicalAction::SecondaryAttack));

        let second = tracker.sample(&[LogicalAction::SecondaryAttack], aim);
        assert!(!second.pressed(LogicalAction::SecondaryAttack));
        assert!(second.held(LogicalAction::SecondaryAttack));

        let third = tracker.sample(&[], aim);
        assert!(third.released(LogicalAction::SecondaryAttack));
        assert!(!third.held(LogicalAction::SecondaryAttack));
    }
}
