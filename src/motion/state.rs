//! Motion state and per-frame output types
//!
//! `MotionState` is transient: it belongs to the animator and is rebuilt from
//! the previous step and the current interaction state every frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::oracle::InteractionState;

/// Inputs for a single animation step, derived from the interaction state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub shaking: bool,
    pub loading: bool,
    /// An answer is available
    pub responding: bool,
    /// Scale down bob and jitter
    pub reduced_motion: bool,
}

impl TickInput {
    pub fn from_state(state: &InteractionState) -> Self {
        Self {
            shaking: state.shaking,
            loading: state.loading,
            responding: state.response.is_some(),
            reduced_motion: false,
        }
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }
}

/// Physics-like quantities advanced every step (explicit Euler)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Euler angles (radians)
    pub rotation: Vec3,
    pub angular_velocity: Vec3,
    /// 0 at rest, 1 right after a shake starts
    pub shake_intensity: f32,
    /// 0-1 reveal progress of the answer
    pub emerge_progress: f32,
    /// Emerge value when the current easing started
    pub emerge_from: f32,
    /// Where emerge is heading (0 or 1)
    pub emerge_target: f32,
    /// Seconds since the current easing started
    pub emerge_elapsed: f32,
    /// Seconds the answer has been settled (responding, not shaking)
    pub settled_time: f32,
    /// Smoothed 0-1 follower of the loading flag
    pub loading_level: f32,
    /// Whether the previous step was shaking (edge detection)
    pub was_shaking: bool,
    /// Seconds of simulated time
    pub time: f32,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            shake_intensity: 0.0,
            emerge_progress: 0.0,
            emerge_from: 0.0,
            emerge_target: 0.0,
            emerge_elapsed: 0.0,
            settled_time: 0.0,
            loading_level: 0.0,
            was_shaking: false,
            time: 0.0,
        }
    }
}

/// Transform applied to the ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPose {
    /// Includes the idle bob offset
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

/// Values a shader (or CSS custom properties) consume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub time: f32,
    pub shake_intensity: f32,
    pub emerge_progress: f32,
}

/// Auxiliary effects modulated by loading; no bearing on interaction state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effects {
    pub light_intensity: f32,
    pub light_position: Vec3,
    /// Particle halo swirl (rad/s)
    pub particle_swirl: f32,
    pub particle_opacity: f32,
    /// RGB in 0-1
    pub glow_color: Vec3,
}

/// Everything the front-end needs to draw one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub pose: BallPose,
    pub uniforms: Uniforms,
    pub effects: Effects,
    /// Depth of the response carrier (hidden inside → at the window)
    pub carrier_depth: f32,
    pub text_opacity: f32,
}
