//! Frame-rate independent driver
//!
//! Accumulates real frame time and runs fixed `FRAME_DT` steps, the same
//! way regardless of display refresh rate.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effects::compose_frame;
use super::state::{Frame, MotionState, TickInput};
use super::tick::tick;
use crate::consts::*;
use crate::oracle::InteractionState;

/// Owns the motion state and its seeded RNG
#[derive(Debug, Clone)]
pub struct Animator {
    motion: MotionState,
    rng: Pcg32,
    accumulator: f32,
    reduced_motion: bool,
}

impl Animator {
    pub fn new(seed: u64) -> Self {
        Self {
            motion: MotionState::default(),
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            reduced_motion: false,
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    /// Advance by a real frame delta (seconds) and return the frame to draw
    pub fn advance(&mut self, state: &InteractionState, frame_dt: f32) -> Frame {
        let input = self.input_for(state);
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DELTA);

        let mut substeps = 0;
        while self.accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.motion, &input, &mut self.rng, FRAME_DT);
            self.accumulator -= FRAME_DT;
            substeps += 1;
        }
        // Drop backlog we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(FRAME_DT);
        }

        compose_frame(&self.motion, &input)
    }

    /// Frame for the current motion without advancing time
    pub fn frame(&self, state: &InteractionState) -> Frame {
        compose_frame(&self.motion, &self.input_for(state))
    }

    /// The answer has fully emerged
    pub fn revealed(&self) -> bool {
        self.motion.emerge_progress >= 1.0 - 1e-4
    }

    fn input_for(&self, state: &InteractionState) -> TickInput {
        TickInput::from_state(state).with_reduced_motion(self.reduced_motion)
    }
}
