use glam::Affine3A;
use rustc_hash::FxHashMap;

use crate::errors::{AnimationError, Result};
use crate::transform::JointTransform;

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// `None` for a root joint.
    pub parent: Option<usize>,
    /// Rest pose, relative to the parent.
    pub bind_local: JointTransform,

    // === Runtime Data ===
    pub(crate) local: JointTransform,
    pub(crate) global: Affine3A,
}

impl Joint {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>, bind_local: JointTransform) -> Self {
        Self {
            name: name.into(),
            parent,
            bind_local,
            local: bind_local,
            global: Affine3A::IDENTITY,
        }
    }

    /// Current pose, relative to the parent.
    #[inline]
    #[must_use]
    pub fn local(&self) -> &JointTransform {
        &self.local
    }

    /// Current pose in skeleton space.
    #[inline]
    #[must_use]
    pub fn global(&self) -> &Affine3A {
        &self.global
    }
}

/// A joint hierarchy stored as a flat array.
///
/// Every joint's parent is stored at a lower index than the joint itself, so
/// a single forward pass resolves all global transforms.
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    joints: Vec<Joint>,
    lookup: FxHashMap<String, usize>,

    // Static data, fixed at construction
    bind_globals: Vec<Affine3A>,
    inverse_bind_matrices: Vec<Affine3A>,
}

impl Skeleton {
    /// Builds a skeleton in its bind pose.
    ///
    /// Fails if the joint list is empty, a parent index is out of range, a
    /// joint precedes its parent, the parent links form a cycle, or two
    /// joints share a name.
    pub fn new(name: impl Into<String>, joints: Vec<Joint>) -> Result<Self> {
        let name = name.into();
        if joints.is_empty() {
            return Err(AnimationError::EmptySkeleton(name));
        }

        let count = joints.len();
        for (index, joint) in joints.iter().enumerate() {
            if let Some(parent) = joint.parent
                && parent >= count
            {
                return Err(AnimationError::ParentOutOfRange {
                    joint: index,
                    parent,
                    count,
                });
            }
        }

        for (index, joint) in joints.iter().enumerate() {
            if let Some(parent) = joint.parent
                && parent >= index
            {
                if let Some(revisited) = find_cycle(&joints, index) {
                    return Err(AnimationError::CyclicHierarchy { joint: revisited });
                }
                return Err(AnimationError::ParentAfterChild {
                    joint: index,
                    parent,
                });
            }
        }

        let mut lookup = FxHashMap::default();
        lookup.reserve(count);
        for (index, joint) in joints.iter().enumerate() {
            if let Some(&first) = lookup.get(&joint.name) {
                return Err(AnimationError::DuplicateJointName {
                    name: joint.name.clone(),
                    first,
                    second: index,
                });
            }
            lookup.insert(joint.name.clone(), index);
        }

        let mut skeleton = Self {
            name,
            joints,
            lookup,
            bind_globals: Vec::new(),
            inverse_bind_matrices: Vec::new(),
        };

        skeleton.reset_to_bind_pose();
        skeleton.bind_globals = skeleton.joints.iter().map(|j| j.global).collect();
        skeleton.inverse_bind_matrices = skeleton.bind_globals.iter().map(Affine3A::inverse).collect();

        Ok(skeleton)
    }

    /// Replaces the inverse bind matrices derived from the bind pose with
    /// ones supplied by the asset loader.
    pub fn with_inverse_bind_matrices(mut self, matrices: Vec<Affine3A>) -> Result<Self> {
        if matrices.len() != self.joints.len() {
            return Err(AnimationError::InverseBindCountMismatch {
                expected: self.joints.len(),
                actual: matrices.len(),
            });
        }
        self.inverse_bind_matrices = matrices;
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    #[must_use]
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Bind-pose local transforms, index-aligned with the joints.
    #[must_use]
    pub fn bind_pose(&self) -> Vec<JointTransform> {
        self.joints.iter().map(|j| j.bind_local).collect()
    }

    /// Current local transforms, index-aligned with the joints.
    #[must_use]
    pub fn local_pose(&self) -> Vec<JointTransform> {
        self.joints.iter().map(|j| j.local).collect()
    }

    #[must_use]
    pub fn global_transform(&self, index: usize) -> Option<&Affine3A> {
        self.joints.get(index).map(|j| &j.global)
    }

    /// Skeleton-space bind transform of a joint.
    #[must_use]
    pub fn bind_global_transform(&self, index: usize) -> Option<&Affine3A> {
        self.bind_globals.get(index)
    }

    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Affine3A] {
        &self.inverse_bind_matrices
    }

    /// Position/rotation/scale of a joint's global transform, for placing
    /// debug geometry.
    #[must_use]
    pub fn joint_debug_transform(&self, index: usize) -> Option<JointTransform> {
        self.joints.get(index).map(|j| JointTransform::from_affine(&j.global))
    }

    /// Sets one joint's local transform. Globals are stale until the next
    /// [`compute_global_pose`](Self::compute_global_pose).
    pub fn set_local_transform(&mut self, index: usize, transform: JointTransform) -> bool {
        match self.joints.get_mut(index) {
            Some(joint) => {
                joint.local = transform;
                true
            }
            None => false,
        }
    }

    /// Copies `pose` into the local transforms. Extra entries are ignored,
    /// missing ones leave their joints untouched.
    pub fn write_local_pose(&mut self, pose: &[JointTransform]) {
        for (joint, transform) in self.joints.iter_mut().zip(pose) {
            joint.local = *transform;
        }
    }

    /// Restores the bind pose and recomputes globals.
    pub fn reset_to_bind_pose(&mut self) {
        for joint in &mut self.joints {
            joint.local = joint.bind_local;
        }
        self.compute_global_pose();
    }

    /// Resolves every joint's global transform from the local pose.
    pub fn compute_global_pose(&mut self) {
        for i in 0..self.joints.len() {
            let local = self.joints[i].local.to_affine();
            self.joints[i].global = match self.joints[i].parent {
                Some(parent) => self.joints[parent].global * local,
                None => local,
            };
        }
    }
}

/// Follows parent links from `start` and returns the first joint reached
/// twice, which lies on the cycle. `None` if the chain ends at a root.
fn find_cycle(joints: &[Joint], start: usize) -> Option<usize> {
    let mut visited = vec![false; joints.len()];
    let mut current = Some(start);
    while let Some(index) = current {
        if visited[index] {
            return Some(index);
        }
        visited[index] = true;
        current = joints[index].parent;
    }
    None
}
