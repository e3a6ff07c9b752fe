use glam::Mat4;

use crate::blend_tree::BlendTree;
use crate::settings::AnimatorSettings;
use crate::skeleton::Skeleton;
use crate::transform::JointTransform;

/// Drives a [`BlendTree`] on a [`Skeleton`] and builds the skinning palette.
///
/// The animator exclusively owns the skeleton's pose buffers and the palette;
/// renderers and debug tools only read them after [`update`](Self::update)
/// returns for the frame.
#[derive(Debug, Clone)]
pub struct Animator {
    skeleton: Skeleton,
    blend_tree: BlendTree,
    settings: AnimatorSettings,

    // === Runtime Data ===
    // One matrix per joint, index-aligned with the skeleton.
    // Data flow: data here -> copy to GPU storage buffer
    bone_palette: Vec<Mat4>,
}

impl Animator {
    #[must_use]
    pub fn new(skeleton: Skeleton) -> Self {
        let mut animator = Self {
            bone_palette: vec![Mat4::IDENTITY; skeleton.joint_count()],
            skeleton,
            blend_tree: BlendTree::new(),
            settings: AnimatorSettings::default(),
        };
        animator.rebuild_palette();
        animator
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AnimatorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: AnimatorSettings) {
        self.settings = settings;
    }

    /// Blend tree access for setup-time wiring and parameter control.
    pub fn blend_tree_mut(&mut self) -> &mut BlendTree {
        &mut self.blend_tree
    }

    #[must_use]
    pub fn blend_tree(&self) -> &BlendTree {
        &self.blend_tree
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Per-frame entry point: evaluates the blend tree for `dt` seconds and
    /// refreshes the bone palette.
    pub fn update(&mut self, dt: f32) {
        let step = self.settings.effective_delta(dt);
        self.blend_tree.update(step, &mut self.skeleton);
        self.rebuild_palette();
    }

    /// Skinning matrices: `global * inverse_bind` per joint.
    #[must_use]
    pub fn bone_palette(&self) -> &[Mat4] {
        &self.bone_palette
    }

    /// The palette as raw bytes, ready for a buffer upload.
    #[must_use]
    pub fn palette_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.bone_palette.as_slice())
    }

    /// Global position/rotation/scale of every joint, in skeleton order.
    pub fn joint_debug_transforms(&self) -> impl Iterator<Item = JointTransform> + '_ {
        self.skeleton
            .joints()
            .iter()
            .map(|joint| JointTransform::from_affine(joint.global()))
    }

    fn rebuild_palette(&mut self) {
        let inverse_binds = self.skeleton.inverse_bind_matrices();
        for ((slot, joint), inverse_bind) in self
            .bone_palette
            .iter_mut()
            .zip(self.skeleton.joints())
            .zip(inverse_binds)
        {
            *slot = Mat4::from(*joint.global() * *inverse_bind);
        }
    }
}
