//! Player input collected between ticks
//!
//! The frontend writes the stick and button presses; the flow controller
//! takes one snapshot per frame and then consumes the presses.

use crate::modes::ModeInput;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputRouter {
    stick_x: f32,
    stick_y: f32,
    jump: bool,
    slide: bool,
    action: bool,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-axis stick value, each axis clamped to [-1, 1]
    pub fn set_stick(&mut self, x: f32, y: f32) {
        let clamp = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        self.stick_x = clamp(x);
        self.stick_y = clamp(y);
    }

    pub fn stick(&self) -> (f32, f32) {
        (self.stick_x, self.stick_y)
    }

    pub fn press_jump(&mut self) {
        self.jump = true;
    }

    pub fn press_slide(&mut self) {
        self.slide = true;
    }

    pub fn press_action(&mut self) {
        self.action = true;
    }

    /// What the active mode sees this frame
    pub fn snapshot(&self) -> ModeInput {
        ModeInput {
            stick_x: self.stick_x,
            jump: self.jump,
            slide: self.slide,
            action: self.action,
        }
    }

    /// Clear the one-shot presses; the stick keeps its value
    pub fn consume(&mut self) {
        self.jump = false;
        self.slide = false;
        self.action = false;
    }

    /// Clear everything, stick included
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presses_are_consumed_once() {
        let mut input = InputRouter::new();
        input.set_stick(0.8, 0.0);
        input.press_jump();
        input.press_action();

        let snapshot = input.snapshot();
        assert!(snapshot.jump && snapshot.action && !snapshot.slide);

        input.consume();
        let after = input.snapshot();
        assert!(!after.jump && !after.action);
        assert_eq!(after.stick_x, 0.8);
    }

    #[test]
    fn test_stick_is_clamped() {
        let mut input = InputRouter::new();
        input.set_stick(4.0, f32::NAN);
        assert_eq!(input.stick(), (1.0, 0.0));
    }
}
