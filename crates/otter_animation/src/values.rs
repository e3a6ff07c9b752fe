use glam::{Quat, Vec3};

use crate::transform::JointTransform;

/// Values a [`KeyframeTrack`](crate::tracks::KeyframeTrack) can blend between.
pub trait Interpolatable: Copy + Clone + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        shortest_slerp(start, end, t)
    }
}

impl Interpolatable for JointTransform {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        JointTransform {
            position: start.position.lerp(end.position, t),
            rotation: shortest_slerp(start.rotation, end.rotation, t),
            scale: start.scale.lerp(end.scale, t),
        }
    }
}

/// Spherical interpolation along the shorter arc.
///
/// `q` and `-q` encode the same rotation; when the two inputs lie in opposite
/// hemispheres the end is flipped so the result does not swing the long way
/// round.
#[must_use]
pub fn shortest_slerp(start: Quat, end: Quat, t: f32) -> Quat {
    let end = if start.dot(end) < 0.0 { -end } else { end };
    start.slerp(end, t).normalize()
}

/// Flips `q` into the hemisphere with a non-negative `w`.
#[inline]
#[must_use]
pub fn canonical(q: Quat) -> Quat {
    if q.w < 0.0 { -q } else { q }
}
