//! Clip Processing
//!
//! Derives new clips from existing ones without touching the source:
//!
//! ```rust,ignore
//! let head_only = ClipProcessor::new(&head_shake)
//!     .keep([head_index])
//!     .make_diff_with(&skeleton.bind_pose());
//! ```
//!
//! [`keep`](ClipProcessor::keep) isolates part of a body, and
//! [`make_diff_with`](ClipProcessor::make_diff_with) turns the remaining
//! keyframes into deltas that [`apply_diff`] layers on top of another pose.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::clip::{DiffClip, JointTrack, SkeletalAnim};
use crate::transform::JointTransform;
use crate::values::{canonical, shortest_slerp};

/// Working copy of a clip being reshaped.
#[derive(Debug, Clone)]
pub struct ClipProcessor {
    name: String,
    looping: bool,
    tracks: BTreeMap<usize, JointTrack>,
}

impl ClipProcessor {
    #[must_use]
    pub fn new(clip: &SkeletalAnim) -> Self {
        Self {
            name: clip.name.clone(),
            looping: clip.looping,
            tracks: clip.tracks().clone(),
        }
    }

    /// Drops every track whose joint is not listed.
    #[must_use]
    pub fn keep(mut self, joints: impl IntoIterator<Item = usize>) -> Self {
        let mut kept: SmallVec<[usize; 8]> = joints.into_iter().collect();
        kept.sort_unstable();
        kept.dedup();

        self.tracks.retain(|joint, _| kept.binary_search(joint).is_ok());
        self
    }

    /// Re-expresses every keyframe relative to `base_pose`.
    ///
    /// `base_pose` is indexed by joint. Tracks for joints past its end are
    /// dropped with a warning.
    #[must_use]
    pub fn make_diff_with(self, base_pose: &[JointTransform]) -> DiffClip {
        let mut tracks = BTreeMap::new();
        for (joint, track) in self.tracks {
            let Some(base) = base_pose.get(joint) else {
                log::warn!(
                    "Clip '{}': joint {joint} has no base transform, dropping it from the diff clip",
                    self.name
                );
                continue;
            };
            tracks.insert(joint, track.map_values(|key| diff_against(base, key)));
        }

        DiffClip::from_anim(finish(self.name, self.looping, tracks))
    }

    /// Finishes processing without computing deltas.
    #[must_use]
    pub fn into_clip(self) -> SkeletalAnim {
        finish(self.name, self.looping, self.tracks)
    }
}

fn finish(name: String, looping: bool, tracks: BTreeMap<usize, JointTrack>) -> SkeletalAnim {
    let duration = tracks.values().map(JointTrack::end_time).fold(0.0_f32, f32::max);
    SkeletalAnim::from_parts(name, duration, looping, tracks)
}

/// Delta that takes `base` to `key`. Scale does not participate.
fn diff_against(base: &JointTransform, key: &JointTransform) -> JointTransform {
    JointTransform {
        position: key.position - base.position,
        rotation: canonical((base.rotation.inverse() * key.rotation).normalize()),
        scale: Vec3::ONE,
    }
}

/// Layers a diff-clip sample on top of `accumulated` at `weight`.
///
/// Rotation: `accumulated * slerp(identity, delta, weight)`.
/// Position: `accumulated + weight * delta`. Scale is kept as accumulated.
/// A weight of 0 returns `accumulated` unchanged.
#[must_use]
pub fn apply_diff(accumulated: &JointTransform, delta: &JointTransform, weight: f32) -> JointTransform {
    if weight <= 0.0 {
        return *accumulated;
    }
    let (rotation, offset) = if weight >= 1.0 {
        (delta.rotation, delta.position)
    } else {
        (shortest_slerp(Quat::IDENTITY, delta.rotation, weight), delta.position * weight)
    };

    JointTransform {
        position: accumulated.position + offset,
        rotation: (accumulated.rotation * rotation).normalize(),
        scale: accumulated.scale,
    }
}
