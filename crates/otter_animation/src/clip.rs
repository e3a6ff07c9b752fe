use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::AnimationError;
use crate::skeleton::Skeleton;
use crate::tracks::KeyframeTrack;
use crate::transform::JointTransform;

/// Keyframes for one joint's local transform.
pub type JointTrack = KeyframeTrack<JointTransform>;

/// A skeletal animation clip: one keyframe track per animated joint.
///
/// Joints without a track are left alone when the clip is sampled.
#[derive(Debug, Clone)]
pub struct SkeletalAnim {
    pub name: String,
    pub duration: f32,
    pub looping: bool,
    tracks: BTreeMap<usize, JointTrack>,
}

impl SkeletalAnim {
    /// Creates a looping clip. The duration is the latest track end time.
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: impl IntoIterator<Item = (usize, JointTrack)>) -> Self {
        let tracks: BTreeMap<usize, JointTrack> = tracks.into_iter().collect();
        let duration = tracks
            .values()
            .map(KeyframeTrack::end_time)
            .fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            duration,
            looping: true,
            tracks,
        }
    }

    #[must_use]
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    #[must_use]
    pub fn tracks(&self) -> &BTreeMap<usize, JointTrack> {
        &self.tracks
    }

    #[must_use]
    pub fn track(&self, joint: usize) -> Option<&JointTrack> {
        self.tracks.get(&joint)
    }

    #[must_use]
    pub fn has_track(&self, joint: usize) -> bool {
        self.tracks.contains_key(&joint)
    }

    /// Indices of the animated joints, ascending.
    pub fn joint_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.tracks.keys().copied()
    }

    /// Reports every track that cannot be applied to `skeleton`: unknown
    /// joints, empty tracks, mismatched time/value counts, tracks not starting
    /// at 0 and out-of-order times.
    ///
    /// Problems are returned rather than raised: callers skip the listed
    /// joints and keep going.
    #[must_use]
    pub fn validate(&self, skeleton: &Skeleton) -> Vec<AnimationError> {
        let mut problems = Vec::new();
        for (&joint, track) in &self.tracks {
            if joint >= skeleton.joint_count() {
                problems.push(AnimationError::MissingJoint {
                    clip: self.name.clone(),
                    joint,
                });
            } else if track.is_empty() {
                problems.push(AnimationError::EmptyTrack {
                    clip: self.name.clone(),
                    joint,
                });
            } else if track.times.len() != track.values.len() {
                problems.push(AnimationError::TrackLengthMismatch {
                    clip: self.name.clone(),
                    joint,
                    times: track.times.len(),
                    values: track.values.len(),
                });
            } else if track.times[0].abs() > f32::EPSILON {
                problems.push(AnimationError::TrackStartNotZero {
                    clip: self.name.clone(),
                    joint,
                    start: track.times[0],
                });
            } else if !track.is_sorted() {
                problems.push(AnimationError::UnsortedTrack {
                    clip: self.name.clone(),
                    joint,
                });
            }
        }
        problems
    }

    pub(crate) fn from_parts(name: String, duration: f32, looping: bool, tracks: BTreeMap<usize, JointTrack>) -> Self {
        Self {
            name,
            duration,
            looping,
            tracks,
        }
    }
}

/// A clip whose keyframes are deltas against a base pose.
///
/// Produced by [`ClipProcessor::make_diff_with`](crate::ClipProcessor::make_diff_with)
/// and played by additive blend nodes. Rotations are stored as
/// `inverse(base) * key`, positions as `key - base`, scale as identity.
#[derive(Debug, Clone)]
pub struct DiffClip {
    anim: SkeletalAnim,
}

impl DiffClip {
    pub(crate) fn from_anim(anim: SkeletalAnim) -> Self {
        Self { anim }
    }

    #[must_use]
    pub fn anim(&self) -> &SkeletalAnim {
        &self.anim
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.anim.name
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.anim.duration
    }
}

/// The clip a blend node plays.
#[derive(Debug, Clone)]
pub enum NodeClip {
    Absolute(Arc<SkeletalAnim>),
    Diff(Arc<DiffClip>),
}

impl NodeClip {
    #[must_use]
    pub fn anim(&self) -> &SkeletalAnim {
        match self {
            NodeClip::Absolute(anim) => anim,
            NodeClip::Diff(diff) => diff.anim(),
        }
    }
}

impl From<SkeletalAnim> for NodeClip {
    fn from(anim: SkeletalAnim) -> Self {
        NodeClip::Absolute(Arc::new(anim))
    }
}

impl From<Arc<SkeletalAnim>> for NodeClip {
    fn from(anim: Arc<SkeletalAnim>) -> Self {
        NodeClip::Absolute(anim)
    }
}

impl From<DiffClip> for NodeClip {
    fn from(diff: DiffClip) -> Self {
        NodeClip::Diff(Arc::new(diff))
    }
}

impl From<Arc<DiffClip>> for NodeClip {
    fn from(diff: Arc<DiffClip>) -> Self {
        NodeClip::Diff(diff)
    }
}
