//! Bounding-box bounce

use glam::Vec3;

/// Result of a bounce check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceResult {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Reflect a velocity off a surface with the given normal
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Keep `position` inside the box `[-bounds, bounds]`.
///
/// Any axis past its bound is clamped onto it and its velocity component is
/// reflected inward, scaled by `restitution`.
pub fn bounce_in_box(
    position: Vec3,
    velocity: Vec3,
    bounds: Vec3,
    restitution: f32,
) -> BounceResult {
    let mut position = position;
    let mut velocity = velocity;

    for axis in 0..3 {
        let limit = bounds[axis];
        let outward = if position[axis] > limit {
            1.0
        } else if position[axis] < -limit {
            -1.0
        } else {
            continue;
        };

        position[axis] = outward * limit;
        // Inward-facing wall normal
        let normal = Vec3::AXES[axis] * -outward;
        if velocity.dot(normal) < 0.0 {
            velocity = reflect_velocity(velocity, normal);
        }
        velocity[axis] *= restitution;
    }

    BounceResult { position, velocity }
}
