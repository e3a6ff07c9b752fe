//! # Otter Engine
//!
//! Real-time skeletal animation: joint hierarchies, keyframe clips, additive
//! diff clips and a layered blend tree feeding a GPU skinning palette.
//!
//! ```rust,ignore
//! use otter::prelude::*;
//!
//! let mut animator = Animator::new(skeleton);
//! animator.blend_tree_mut().insert_base(idle)?;
//!
//! let head = ClipProcessor::new(&head_shake)
//!     .keep([head_index])
//!     .make_diff_with(&animator.skeleton().bind_pose());
//! let layer = animator.blend_tree_mut().insert_additive(head, 0.0)?;
//!
//! // every frame
//! animator.blend_tree_mut().set_blend_param(layer, slider)?;
//! animator.update(dt);
//! upload(animator.palette_bytes());
//! ```

pub use glam;
pub use otter_animation as animation;

pub mod prelude {
    pub use otter_animation::{
        Animator, AnimatorSettings, BlendMode, BlendNodeHandle, BlendTree, ClipProcessor, DiffClip, Joint,
        JointTrack, JointTransform, KeyframeTrack, SkeletalAnim, Skeleton,
    };
}
