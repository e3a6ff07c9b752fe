use crate::clip::SkeletalAnim;
use crate::skeleton::Skeleton;
use crate::tracks::KeyframeCursor;
use crate::transform::JointTransform;

/// Maps a playback time onto the clip's timeline.
///
/// Looping clips wrap with a euclidean modulo, others clamp to
/// `[0, duration]`. Zero-length clips always evaluate at 0.
#[must_use]
pub fn normalize_time(duration: f32, looping: bool, time: f32) -> f32 {
    if duration <= 0.0 || !time.is_finite() {
        return 0.0;
    }
    if looping {
        time.rem_euclid(duration)
    } else {
        time.clamp(0.0, duration)
    }
}

#[derive(Debug, Clone)]
struct TrackBinding {
    joint: usize,
    cursor: KeyframeCursor,
}

/// Evaluates a clip into a per-joint local pose.
///
/// A sampler is bound to one clip/skeleton pair. Binding drops tracks that
/// cannot be applied (unknown joint, empty or unsorted keyframes) with a
/// warning; the affected joints keep whatever pose they already had.
#[derive(Debug, Clone, Default)]
pub struct PoseSampler {
    bindings: Vec<TrackBinding>,
}

impl PoseSampler {
    #[must_use]
    pub fn bind(clip: &SkeletalAnim, skeleton: &Skeleton) -> Self {
        let problems = clip.validate(skeleton);
        for problem in &problems {
            log::warn!("Skipping track while binding clip to skeleton '{}': {problem}", skeleton.name());
        }

        let bindings = clip
            .joint_indices()
            .filter(|&joint| !problems.iter().any(|p| p.data_error_joint() == Some(joint)))
            .map(|joint| TrackBinding {
                joint,
                cursor: KeyframeCursor::default(),
            })
            .collect();

        Self { bindings }
    }

    /// Joints this sampler writes, ascending.
    pub fn joints(&self) -> impl Iterator<Item = usize> + '_ {
        self.bindings.iter().map(|b| b.joint)
    }

    /// Overwrites the bound joints of `pose` with the clip's value at `time`.
    ///
    /// Entries for joints the clip does not animate are left untouched.
    pub fn sample_into(&mut self, clip: &SkeletalAnim, time: f32, pose: &mut [JointTransform]) {
        let time = normalize_time(clip.duration, clip.looping, time);
        self.write_tracks(clip, time, pose);
    }

    /// Like [`sample_into`](Self::sample_into) for a time already on the
    /// clip's timeline.
    pub(crate) fn write_tracks(&mut self, clip: &SkeletalAnim, time: f32, pose: &mut [JointTransform]) {
        for binding in &mut self.bindings {
            let Some(track) = clip.track(binding.joint) else {
                continue;
            };
            let Some(slot) = pose.get_mut(binding.joint) else {
                continue;
            };
            if let Some(value) = track.sample_with_cursor(time, &mut binding.cursor) {
                *slot = value;
            }
        }
    }

    /// Full local-pose snapshot: the skeleton's current pose with the clip's
    /// joints replaced by their sampled values.
    #[must_use]
    pub fn sample_pose(&mut self, clip: &SkeletalAnim, time: f32, skeleton: &Skeleton) -> Vec<JointTransform> {
        let mut pose = skeleton.local_pose();
        self.sample_into(clip, time, &mut pose);
        pose
    }
}
