//! Skeletal animation for the Otter engine.
//!
//! Data flow, once per frame:
//!
//! ```text
//! Skeleton + SkeletalAnim ──► ClipProcessor (keep / make_diff_with) ──► DiffClip
//!                 │                                                      │
//!                 └──────────────► BlendTree (Base + Additive nodes) ◄───┘
//!                                         │
//!                           Animator::update(dt)
//!                                         │
//!               Skeleton local/global pose ──► bone palette ──► renderer
//! ```
//!
//! The subsystem is single-threaded and synchronous: everything is driven by
//! the delta time handed to [`Animator::update`].

pub mod animator;
pub mod blend_tree;
pub mod clip;
pub mod errors;
pub mod processor;
pub mod sampler;
pub mod settings;
pub mod skeleton;
pub mod tracks;
pub mod transform;
pub mod values;

pub use animator::Animator;
pub use blend_tree::{BlendMode, BlendNode, BlendNodeHandle, BlendTree};
pub use clip::{DiffClip, JointTrack, NodeClip, SkeletalAnim};
pub use errors::{AnimationError, Result};
pub use processor::{ClipProcessor, apply_diff};
pub use sampler::{PoseSampler, normalize_time};
pub use settings::AnimatorSettings;
pub use skeleton::{Joint, Skeleton};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use transform::JointTransform;
pub use values::Interpolatable;
