//! Blend Tree
//!
//! An ordered list of animation layers evaluated once per frame.
//!
//! Node 0 is the **Base** node: it plays an absolute clip and produces the
//! frame's starting pose. Every later node is **Additive**: it plays a
//! [`DiffClip`](crate::DiffClip) and layers it on top of the pose built so
//! far, scaled by its blend parameter. Layers are applied strictly in
//! insertion order, so a frame is a pure function of elapsed time and the
//! blend parameters.
//!
//! Parameter edits made through [`BlendTree::set_blend_param`] are staged and
//! committed at the start of the next [`BlendTree::update`]; however many
//! edits happen between two frames, each frame is evaluated exactly once with
//! one consistent set of parameters.

use slotmap::{SlotMap, new_key_type};

use crate::clip::NodeClip;
use crate::errors::{AnimationError, Result};
use crate::processor::apply_diff;
use crate::sampler::{PoseSampler, normalize_time};
use crate::skeleton::Skeleton;
use crate::transform::JointTransform;

new_key_type! {
    /// Stable handle to a node of a [`BlendTree`].
    pub struct BlendNodeHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Replaces the pose of every joint its clip animates.
    Base,
    /// Adds its diff clip's deltas on top of the accumulated pose.
    Additive,
}

#[derive(Debug, Clone)]
pub struct BlendNode {
    clip: NodeClip,
    mode: BlendMode,

    blend_param: f32,
    pending_param: Option<f32>,

    time: f32,
    looping: bool,
    finished: bool,

    // Bound lazily against the skeleton seen on the first update
    sampler: Option<PoseSampler>,
}

impl BlendNode {
    fn new(clip: NodeClip, mode: BlendMode, blend_param: f32) -> Self {
        let looping = clip.anim().looping;
        Self {
            clip,
            mode,
            blend_param,
            pending_param: None,
            time: 0.0,
            looping,
            finished: false,
            sampler: None,
        }
    }

    #[must_use]
    pub fn clip(&self) -> &NodeClip {
        &self.clip
    }

    #[must_use]
    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    /// The parameter used by the most recent update.
    #[must_use]
    pub fn blend_param(&self) -> f32 {
        self.blend_param
    }

    /// A staged parameter that the next update will commit.
    #[must_use]
    pub fn pending_blend_param(&self) -> Option<f32> {
        self.pending_param
    }

    /// Playback position on the clip's timeline.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// `true` once a non-looping node has reached the end of its clip.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn advance(&mut self, dt: f32) {
        let duration = self.clip.anim().duration;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }

        let time = self.time + dt;
        if self.looping {
            self.time = time.rem_euclid(duration);
        } else if time >= duration {
            // Hold the last frame
            self.time = duration;
            self.finished = true;
        } else {
            self.time = time;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlendTree {
    nodes: SlotMap<BlendNodeHandle, BlendNode>,
    order: Vec<BlendNodeHandle>,

    // Per-frame scratch, kept to avoid reallocating
    pose: Vec<JointTransform>,
    deltas: Vec<JointTransform>,
}

impl BlendTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its handle.
    ///
    /// The first node must be [`BlendMode::Base`] with an absolute clip;
    /// every later node must be [`BlendMode::Additive`] with a diff clip.
    /// `initial_param` is clamped to `[0, 1]`.
    pub fn insert(
        &mut self,
        clip: impl Into<NodeClip>,
        mode: BlendMode,
        initial_param: f32,
    ) -> Result<BlendNodeHandle> {
        let clip = clip.into();
        let position = self.order.len();

        let expected = if position == 0 {
            BlendMode::Base
        } else {
            BlendMode::Additive
        };
        if mode != expected {
            return Err(AnimationError::BaseNodeMisplaced { position, mode });
        }

        let kind_matches = matches!(
            (&clip, mode),
            (NodeClip::Absolute(_), BlendMode::Base) | (NodeClip::Diff(_), BlendMode::Additive)
        );
        if !kind_matches {
            return Err(AnimationError::ClipKindMismatch { mode });
        }

        let param = clamp_param(initial_param)?;
        let handle = self.nodes.insert(BlendNode::new(clip, mode, param));
        self.order.push(handle);
        Ok(handle)
    }

    /// Inserts the base node with a parameter of 0.
    pub fn insert_base(&mut self, clip: impl Into<NodeClip>) -> Result<BlendNodeHandle> {
        self.insert(clip, BlendMode::Base, 0.0)
    }

    /// Appends an additive layer.
    pub fn insert_additive(&mut self, clip: impl Into<NodeClip>, initial_param: f32) -> Result<BlendNodeHandle> {
        self.insert(clip, BlendMode::Additive, initial_param)
    }

    /// Stages a new blend parameter for a node, clamped to `[0, 1]`.
    ///
    /// The value takes effect on the next [`update`](Self::update).
    pub fn set_blend_param(&mut self, handle: BlendNodeHandle, value: f32) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(AnimationError::InvalidNodeHandle)?;
        node.pending_param = Some(clamp_param(value)?);
        Ok(())
    }

    /// The parameter used by the most recent update.
    pub fn blend_param(&self, handle: BlendNodeHandle) -> Result<f32> {
        self.nodes
            .get(handle)
            .map(BlendNode::blend_param)
            .ok_or(AnimationError::InvalidNodeHandle)
    }

    pub fn set_looping(&mut self, handle: BlendNodeHandle, looping: bool) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(AnimationError::InvalidNodeHandle)?;
        node.looping = looping;
        if looping {
            node.finished = false;
        }
        Ok(())
    }

    /// Moves a node's clock. Applied immediately.
    pub fn set_time(&mut self, handle: BlendNodeHandle, time: f32) -> Result<()> {
        let node = self.nodes.get_mut(handle).ok_or(AnimationError::InvalidNodeHandle)?;
        let duration = node.clip.anim().duration;
        node.time = normalize_time(duration, node.looping, time);
        node.finished = !node.looping && duration > 0.0 && node.time >= duration;
        Ok(())
    }

    #[must_use]
    pub fn node(&self, handle: BlendNodeHandle) -> Option<&BlendNode> {
        self.nodes.get(handle)
    }

    /// Node handles in evaluation order.
    pub fn handles(&self) -> impl Iterator<Item = BlendNodeHandle> + '_ {
        self.order.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Advances every node by `dt` seconds and writes the blended local pose
    /// into `skeleton`, then recomputes its global pose.
    ///
    /// Each frame starts from the bind pose. The base node overwrites the
    /// joints its clip animates, then additive nodes are layered in
    /// insertion order. Negative or non-finite `dt` counts as 0.
    pub fn update(&mut self, dt: f32, skeleton: &mut Skeleton) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let joint_count = skeleton.joint_count();

        let Self {
            nodes,
            order,
            pose,
            deltas,
        } = self;

        pose.clear();
        pose.extend(skeleton.joints().iter().map(|j| j.bind_local));

        for &handle in order.iter() {
            let Some(node) = nodes.get_mut(handle) else {
                continue;
            };

            if let Some(param) = node.pending_param.take() {
                node.blend_param = param;
            }
            node.advance(dt);

            let anim = node.clip.anim();
            let sampler = node.sampler.get_or_insert_with(|| PoseSampler::bind(anim, skeleton));

            match node.mode {
                BlendMode::Base => sampler.write_tracks(anim, node.time, pose),
                BlendMode::Additive => {
                    if node.blend_param <= 0.0 {
                        continue;
                    }
                    deltas.clear();
                    deltas.resize(joint_count, JointTransform::IDENTITY);
                    sampler.write_tracks(anim, node.time, deltas);

                    for joint in sampler.joints().filter(|&j| j < joint_count) {
                        pose[joint] = apply_diff(&pose[joint], &deltas[joint], node.blend_param);
                    }
                }
            }
        }

        skeleton.write_local_pose(pose);
        skeleton.compute_global_pose();
    }
}

fn clamp_param(value: f32) -> Result<f32> {
    if !value.is_finite() {
        return Err(AnimationError::NonFiniteBlendParam(value));
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        log::debug!("Blend parameter {value} clamped to {clamped}");
    }
    Ok(clamped)
}
