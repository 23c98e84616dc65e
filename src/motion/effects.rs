//! Frame composition
//!
//! Turns a motion state into the values the front-end draws: the ball pose
//! with idle bobbing, reveal uniforms, and the loading-modulated light and
//! particle halo.

use glam::Vec3;

use super::state::{BallPose, Effects, Frame, MotionState, TickInput, Uniforms};
use super::tick::motion_scale;
use crate::consts::*;
use crate::lerp;

/// Mystic cyan (#00D9FF)
pub const GLOW_IDLE: Vec3 = Vec3::new(0.0, 0.851, 1.0);
/// Dramatic magenta (#E94560)
pub const GLOW_LOADING: Vec3 = Vec3::new(0.914, 0.271, 0.376);

const LIGHT_ORBIT_RADIUS: f32 = 5.0;
const LIGHT_ORBIT_SPEED: f32 = 0.5;
const LIGHT_HEIGHT: f32 = 3.0;
const PARTICLE_SWIRL_IDLE: f32 = 0.06;
const PARTICLE_SWIRL_LOADING: f32 = 0.3;

/// Vertical bob offset; bounded by `BOB_AMPLITUDE` and periodic in time
#[inline]
pub fn bob_offset(motion: &MotionState, input: &TickInput) -> f32 {
    let calm = 1.0 - motion.shake_intensity.clamp(0.0, 1.0);
    BOB_AMPLITUDE * motion_scale(input) * calm * (BOB_FREQUENCY * motion.time).sin()
}

/// Build the frame for the current motion state
pub fn compose_frame(motion: &MotionState, input: &TickInput) -> Frame {
    let t = motion.time;

    let pose = BallPose {
        position: motion.position + Vec3::Y * bob_offset(motion, input),
        rotation: motion.rotation,
        scale: 1.0 + 0.04 * motion.shake_intensity,
    };

    let uniforms = Uniforms {
        time: t,
        shake_intensity: motion.shake_intensity,
        emerge_progress: motion.emerge_progress,
    };

    let halo_active = input.shaking || input.loading;
    let effects = Effects {
        light_intensity: 0.5 + (t * 2.0).sin() * 0.2 + 0.6 * motion.loading_level,
        light_position: Vec3::new(
            (t * LIGHT_ORBIT_SPEED).cos() * LIGHT_ORBIT_RADIUS,
            LIGHT_HEIGHT,
            (t * LIGHT_ORBIT_SPEED).sin() * LIGHT_ORBIT_RADIUS,
        ),
        particle_swirl: lerp(
            PARTICLE_SWIRL_IDLE,
            PARTICLE_SWIRL_LOADING,
            motion.loading_level,
        ),
        particle_opacity: if halo_active {
            0.18 + (t * 1.5).sin() * 0.06
        } else {
            0.0
        },
        glow_color: GLOW_IDLE.lerp(GLOW_LOADING, motion.loading_level),
    };

    Frame {
        pose,
        uniforms,
        effects,
        carrier_depth: lerp(
            CARRIER_HIDDEN_DEPTH,
            CARRIER_FACE_DEPTH,
            motion.emerge_progress,
        ),
        text_opacity: motion.emerge_progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bob_is_bounded() {
        let mut motion = MotionState::default();
        let input = TickInput::default();
        for i in 0..1000 {
            motion.time = i as f32 * FRAME_DT;
            assert!(bob_offset(&motion, &input).abs() <= BOB_AMPLITUDE);
        }
    }

    #[test]
    fn test_rest_pose_only_bobs() {
        let mut motion = MotionState::default();
        motion.time = 1.3;
        let frame = compose_frame(&motion, &TickInput::default());
        assert_eq!(frame.pose.position.x, 0.0);
        assert_eq!(frame.pose.position.z, 0.0);
        assert!(frame.pose.position.y.abs() <= BOB_AMPLITUDE);
        assert_eq!(frame.pose.scale, 1.0);
    }

    #[test]
    fn test_halo_hidden_when_idle() {
        let motion = MotionState::default();
        let frame = compose_frame(&motion, &TickInput::default());
        assert_eq!(frame.effects.particle_opacity, 0.0);
        assert_eq!(frame.effects.glow_color, GLOW_IDLE);

        let loading = TickInput {
            loading: true,
            ..Default::default()
        };
        let frame = compose_frame(&motion, &loading);
        assert!(frame.effects.particle_opacity > 0.0);
    }

    #[test]
    fn test_carrier_tracks_emerge() {
        let mut motion = MotionState::default();
        let hidden = compose_frame(&motion, &TickInput::default());
        assert_eq!(hidden.carrier_depth, CARRIER_HIDDEN_DEPTH);
        assert_eq!(hidden.text_opacity, 0.0);

        motion.emerge_progress = 1.0;
        let shown = compose_frame(&motion, &TickInput::default());
        assert!((shown.carrier_depth - CARRIER_FACE_DEPTH).abs() < 1e-6);
        assert_eq!(shown.text_opacity, 1.0);
    }

    #[test]
    fn test_loading_speeds_up_swirl() {
        let mut motion = MotionState::default();
        let calm = compose_frame(&motion, &TickInput::default());
        motion.loading_level = 1.0;
        let busy = compose_frame(&motion, &TickInput::default());
        assert!(busy.effects.particle_swirl > calm.effects.particle_swirl);
        assert!(busy.effects.light_intensity > calm.effects.light_intensity);
    }
}
