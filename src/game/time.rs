//! Fixed-step clock
//!
//! Turns variable frame times into a whole number of physics steps.

use std::time::Duration;

/// Most physics steps a single frame may run
pub const MAX_STEPS_PER_FRAME: u32 = 10;

/// Accumulates frame time and hands out fixed steps
pub struct FixedTimestep {
    /// Length of one step in seconds
    step: f32,
    /// Time not yet consumed by a step
    accumulator: f32,
    /// Total time fed in, in seconds
    elapsed: f32,
}

impl FixedTimestep {
    pub fn new(step: f32) -> Self {
        Self {
            step: if step > 0.0 { step } else { 0.02 },
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Add a frame's duration and return how many steps to run
    pub fn update(&mut self, delta: Duration) -> u32 {
        let delta_secs = delta.as_secs_f32();
        self.elapsed += delta_secs;
        self.accumulator += delta_secs;

        let steps = (self.accumulator / self.step) as u32;
        if steps > MAX_STEPS_PER_FRAME {
            // Too far behind to catch up; drop the backlog
            self.accumulator = 0.0;
            return MAX_STEPS_PER_FRAME;
        }
        self.accumulator -= steps as f32 * self.step;
        steps
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Drop any leftover time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.elapsed = 0.0;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(0.02)
    }
}
