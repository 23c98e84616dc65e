//! Fixed timestep animation step
//!
//! Advances the ball's motion deterministically from the previous step, the
//! interaction flags and a seeded RNG.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use super::bounds::bounce_in_box;
use super::state::{MotionState, TickInput};
use crate::consts::*;
use crate::{ease_out_cubic, lerp};

/// How fast the ball turns its window back to the viewer (1/s)
const FACE_RATE: f32 = 4.0;
/// Motion amplitude multiplier under reduced motion
const REDUCED_MOTION_SCALE: f32 = 0.3;
/// Below this the return spring snaps to rest
const REST_EPSILON: f32 = 1e-5;

/// Advance the motion state by one fixed timestep
pub fn tick<R: Rng>(motion: &mut MotionState, input: &TickInput, rng: &mut R, dt: f32) {
    motion.time += dt;
    let amplitude = motion_scale(input);

    if input.shaking && !motion.was_shaking {
        kick(motion, rng, amplitude);
    }
    motion.was_shaking = input.shaking;

    if input.shaking {
        shake_step(motion, rng, amplitude, dt);
    } else {
        settle_step(motion, input.responding, dt);
    }

    // Loading only drives auxiliary effects
    let loading_target = if input.loading { 1.0 } else { 0.0 };
    let rate = (LOADING_RESPONSE * dt).min(1.0);
    motion.loading_level += (loading_target - motion.loading_level) * rate;

    emerge_step(motion, input, dt);
}

/// Multiplier applied to jitter and bobbing
#[inline]
pub fn motion_scale(input: &TickInput) -> f32 {
    if input.reduced_motion {
        REDUCED_MOTION_SCALE
    } else {
        1.0
    }
}

/// Initial impulse when a shake begins
fn kick<R: Rng>(motion: &mut MotionState, rng: &mut R, amplitude: f32) {
    motion.velocity += random_unit_box(rng) * SHAKE_IMPULSE * amplitude;
    motion.angular_velocity += random_unit_box(rng) * SHAKE_SPIN_IMPULSE * amplitude;
    motion.shake_intensity = 1.0;
}

fn shake_step<R: Rng>(motion: &mut MotionState, rng: &mut R, amplitude: f32, dt: f32) {
    motion.velocity *= SHAKE_DAMPING;
    let jitter = SHAKE_JITTER * motion.shake_intensity * amplitude;
    motion.velocity += random_unit_box(rng) * jitter;
    motion.position += motion.velocity * dt;

    motion.angular_velocity *= SPIN_DAMPING;
    motion.angular_velocity += random_unit_box(rng) * jitter * 2.0;
    motion.rotation += motion.angular_velocity * dt;

    let bounce = bounce_in_box(motion.position, motion.velocity, BALL_BOUNDS, RESTITUTION);
    motion.position = bounce.position;
    motion.velocity = bounce.velocity;

    motion.shake_intensity =
        (motion.shake_intensity * SHAKE_INTENSITY_DECAY).max(MIN_SHAKE_INTENSITY);
}

/// Critically damped return to the origin plus idle spin.
///
/// While responding the spin target is zero and every axis eases to the
/// nearest full turn, keeping the answer window toward the viewer.
fn settle_step(motion: &mut MotionState, responding: bool, dt: f32) {
    let omega = RETURN_OMEGA;
    let accel = -omega * omega * motion.position - 2.0 * omega * motion.velocity;
    motion.velocity += accel * dt;
    motion.position += motion.velocity * dt;
    if motion.position.length_squared() < REST_EPSILON * REST_EPSILON
        && motion.velocity.length_squared() < REST_EPSILON * REST_EPSILON
    {
        motion.position = Vec3::ZERO;
        motion.velocity = Vec3::ZERO;
    }

    // While an answer shows, stop spinning and face the viewer
    let spin = if responding { Vec3::ZERO } else { Vec3::Y * IDLE_SPIN };
    motion.angular_velocity = spin + (motion.angular_velocity - spin) * SPIN_DAMPING;

    let face_rate = (FACE_RATE * dt).min(1.0);
    let mut rotation = motion.rotation + motion.angular_velocity * dt;
    rotation.x -= facing_offset(rotation.x) * face_rate;
    rotation.z -= facing_offset(rotation.z) * face_rate;
    if responding {
        rotation.y -= facing_offset(rotation.y) * face_rate;
    } else {
        rotation.y %= TAU;
    }
    motion.rotation = rotation;

    motion.shake_intensity *= 0.9;
    if motion.shake_intensity < 0.01 {
        motion.shake_intensity = 0.0;
    }
}

/// Answer reveal: wait for the delay, then ease toward the target
fn emerge_step(motion: &mut MotionState, input: &TickInput, dt: f32) {
    let settled = input.responding && !input.shaking;
    motion.settled_time = if settled { motion.settled_time + dt } else { 0.0 };

    let target = if settled && motion.settled_time >= REVEAL_DELAY {
        1.0
    } else {
        0.0
    };
    if (target - motion.emerge_target).abs() > f32::EPSILON {
        motion.emerge_from = motion.emerge_progress;
        motion.emerge_target = target;
        motion.emerge_elapsed = 0.0;
    }

    motion.emerge_elapsed = (motion.emerge_elapsed + dt).min(EMERGE_DURATION);
    let t = motion.emerge_elapsed / EMERGE_DURATION;
    motion.emerge_progress =
        lerp(motion.emerge_from, motion.emerge_target, ease_out_cubic(t)).clamp(0.0, 1.0);
}

/// Signed distance from `angle` to the nearest multiple of a full turn
#[inline]
fn facing_offset(angle: f32) -> f32 {
    angle - (angle / TAU).round() * TAU
}

#[inline]
fn random_unit_box<R: Rng>(rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn shaking() -> TickInput {
        TickInput {
            shaking: true,
            loading: true,
            ..Default::default()
        }
    }

    fn responding() -> TickInput {
        TickInput {
            responding: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_shake_start_injects_impulse() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(1);
        tick(&mut motion, &shaking(), &mut rng, FRAME_DT);
        assert!(motion.was_shaking);
        assert!(motion.velocity.length() > 0.0);
        assert!(motion.shake_intensity > MIN_SHAKE_INTENSITY);
    }

    #[test]
    fn test_origin_is_fixed_point_when_idle() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..600 {
            tick(&mut motion, &TickInput::default(), &mut rng, FRAME_DT);
            assert_eq!(motion.position, Vec3::ZERO);
            assert_eq!(motion.velocity, Vec3::ZERO);
        }
    }

    #[test]
    fn test_returns_to_origin_after_shake() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..90 {
            tick(&mut motion, &shaking(), &mut rng, FRAME_DT);
        }
        for _ in 0..600 {
            tick(&mut motion, &TickInput::default(), &mut rng, FRAME_DT);
        }
        assert!(motion.position.length() < 1e-3);
        assert_eq!(motion.shake_intensity, 0.0);
    }

    #[test]
    fn test_idle_spins_slowly() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..600 {
            tick(&mut motion, &TickInput::default(), &mut rng, FRAME_DT);
        }
        assert!((motion.angular_velocity.y - IDLE_SPIN).abs() < 0.01);
        assert!(motion.rotation.y.abs() < TAU);
    }

    #[test]
    fn test_responding_stops_spin_and_faces_viewer() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..90 {
            tick(&mut motion, &shaking(), &mut rng, FRAME_DT);
        }
        for _ in 0..600 {
            tick(&mut motion, &responding(), &mut rng, FRAME_DT);
        }
        assert!(motion.angular_velocity.length() < 1e-3);
        assert!(facing_offset(motion.rotation.x).abs() < 1e-3);
        assert!(facing_offset(motion.rotation.y).abs() < 1e-3);
        assert!(facing_offset(motion.rotation.z).abs() < 1e-3);

        // Idle spin resumes once the answer is cleared
        for _ in 0..600 {
            tick(&mut motion, &TickInput::default(), &mut rng, FRAME_DT);
        }
        assert!((motion.angular_velocity.y - IDLE_SPIN).abs() < 0.01);
    }

    #[test]
    fn test_emerge_waits_for_reveal_delay_then_completes() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let steps_before_reveal = (REVEAL_DELAY / FRAME_DT) as usize - 2;
        for _ in 0..steps_before_reveal {
            tick(&mut motion, &responding(), &mut rng, FRAME_DT);
        }
        assert_eq!(motion.emerge_progress, 0.0);

        let steps = ((REVEAL_DELAY + EMERGE_DURATION) / FRAME_DT) as usize + 10;
        for _ in 0..steps {
            tick(&mut motion, &responding(), &mut rng, FRAME_DT);
        }
        assert!((motion.emerge_progress - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_emerge_hidden_while_shaking() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(6);
        let input = TickInput {
            shaking: true,
            responding: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut motion, &input, &mut rng, FRAME_DT);
        }
        assert_eq!(motion.emerge_progress, 0.0);
    }

    #[test]
    fn test_emerge_fades_out_after_reset() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            tick(&mut motion, &responding(), &mut rng, FRAME_DT);
        }
        assert!(motion.emerge_progress > 0.99);

        for _ in 0..((EMERGE_DURATION / FRAME_DT) as usize + 5) {
            tick(&mut motion, &TickInput::default(), &mut rng, FRAME_DT);
        }
        assert!(motion.emerge_progress < 1e-5);
    }

    #[test]
    fn test_loading_level_follows_flag() {
        let mut motion = MotionState::default();
        let mut rng = Pcg32::seed_from_u64(8);
        let loading = TickInput {
            loading: true,
            ..Default::default()
        };
        for _ in 0..300 {
            tick(&mut motion, &loading, &mut rng, FRAME_DT);
        }
        assert!(motion.loading_level > 0.99);
    }

    #[test]
    fn test_determinism() {
        // Same seed, same inputs, same motion
        let mut a = MotionState::default();
        let mut b = MotionState::default();
        let mut rng_a = Pcg32::seed_from_u64(99999);
        let mut rng_b = Pcg32::seed_from_u64(99999);

        let inputs = [shaking(), shaking(), TickInput::default(), responding()];
        for input in inputs.iter().cycle().take(400) {
            tick(&mut a, input, &mut rng_a, FRAME_DT);
            tick(&mut b, input, &mut rng_b, FRAME_DT);
        }

        assert_eq!(a.position, b.position);
        assert_eq!(a.rotation, b.rotation);
        assert_eq!(a.emerge_progress, b.emerge_progress);
    }

    #[test]
    fn test_reduced_motion_softens_kick() {
        let mut full = MotionState::default();
        let mut soft = MotionState::default();
        let mut rng_a = Pcg32::seed_from_u64(10);
        let mut rng_b = Pcg32::seed_from_u64(10);
        tick(&mut full, &shaking(), &mut rng_a, FRAME_DT);
        tick(
            &mut soft,
            &shaking().with_reduced_motion(true),
            &mut rng_b,
            FRAME_DT,
        );
        assert!(soft.velocity.length() < full.velocity.length());
    }

    proptest! {
        #[test]
        fn prop_shaking_never_leaves_bounds(seed in any::<u64>(), steps in 1usize..600) {
            let mut motion = MotionState::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..steps {
                tick(&mut motion, &shaking(), &mut rng, FRAME_DT);
                prop_assert!(motion.position.x.abs() <= BALL_BOUNDS.x);
                prop_assert!(motion.position.y.abs() <= BALL_BOUNDS.y);
                prop_assert!(motion.position.z.abs() <= BALL_BOUNDS.z);
            }
        }

        #[test]
        fn prop_emerge_stays_in_unit_range(
            seed in any::<u64>(),
            flags in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..400),
        ) {
            let mut motion = MotionState::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            for (shake, respond) in flags {
                let input = TickInput {
                    shaking: shake,
                    loading: shake,
                    responding: respond,
                    reduced_motion: false,
                };
                tick(&mut motion, &input, &mut rng, FRAME_DT);
                prop_assert!((0.0..=1.0).contains(&motion.emerge_progress));
            }
        }
    }
}
