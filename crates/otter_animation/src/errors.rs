//! Error Types
//!
//! This module defines the error types used by the animation subsystem.
//!
//! # Overview
//!
//! [`AnimationError`] groups three families of failures:
//! - **Structure** errors: an invalid joint hierarchy. These are fatal at
//!   construction time and no [`Skeleton`](crate::Skeleton) is produced.
//! - **Data** errors: a clip track that cannot be applied to a skeleton.
//!   These are recovered by skipping the offending track and surfaced as
//!   warnings through the `log` facade.
//! - **Range** errors: bad arguments at the blend tree control surface.
//!   These are rejected before they can touch pose state.
//!
//! All fallible APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, AnimationError>`.

use thiserror::Error;

/// The error type for the animation subsystem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    // ========================================================================
    // Structure Errors
    // ========================================================================
    /// A skeleton must contain at least one joint.
    #[error("Skeleton '{0}' has no joints")]
    EmptySkeleton(String),

    /// A joint's parent index points outside the joint array.
    #[error("Joint {joint} has parent index {parent}, but the skeleton only has {count} joints")]
    ParentOutOfRange {
        /// Index of the offending joint
        joint: usize,
        /// The invalid parent index
        parent: usize,
        /// Number of joints in the skeleton
        count: usize,
    },

    /// A joint is stored before its parent.
    #[error("Joint {joint} is stored before its parent {parent}")]
    ParentAfterChild {
        /// Index of the offending joint
        joint: usize,
        /// Index of its parent
        parent: usize,
    },

    /// Following parent links from a joint leads back to itself.
    #[error("Joint {joint} is part of a parent cycle")]
    CyclicHierarchy {
        /// A joint on the cycle
        joint: usize,
    },

    /// Two joints share a name.
    #[error("Joint name '{name}' is used by joints {first} and {second}")]
    DuplicateJointName {
        /// The duplicated name
        name: String,
        /// First joint carrying the name
        first: usize,
        /// Second joint carrying the name
        second: usize,
    },

    /// The supplied inverse bind matrices do not match the joint count.
    #[error("Expected {expected} inverse bind matrices, got {actual}")]
    InverseBindCountMismatch {
        /// Joint count of the skeleton
        expected: usize,
        /// Number of matrices supplied
        actual: usize,
    },

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// A clip has a track for a joint the skeleton does not have.
    #[error("Clip '{clip}' animates joint {joint}, which is not part of the skeleton")]
    MissingJoint {
        /// Clip name
        clip: String,
        /// The unknown joint index
        joint: usize,
    },

    /// A clip track has no keyframes.
    #[error("Clip '{clip}' has an empty track for joint {joint}")]
    EmptyTrack {
        /// Clip name
        clip: String,
        /// Joint the track targets
        joint: usize,
    },

    /// A clip track's keyframe times decrease.
    #[error("Clip '{clip}' has keyframe times out of order for joint {joint}")]
    UnsortedTrack {
        /// Clip name
        clip: String,
        /// Joint the track targets
        joint: usize,
    },

    /// A clip track has a different number of keyframe times and values.
    #[error("Clip '{clip}' has {times} keyframe times but {values} values for joint {joint}")]
    TrackLengthMismatch {
        /// Clip name
        clip: String,
        /// Joint the track targets
        joint: usize,
        /// Number of keyframe times
        times: usize,
        /// Number of keyframe values
        values: usize,
    },

    /// A clip track's first keyframe is not at time 0.
    #[error("Clip '{clip}' starts the track for joint {joint} at {start}s instead of 0")]
    TrackStartNotZero {
        /// Clip name
        clip: String,
        /// Joint the track targets
        joint: usize,
        /// Time of the first keyframe
        start: f32,
    },

    // ========================================================================
    // Range Errors
    // ========================================================================
    /// The handle does not refer to a node of this blend tree.
    #[error("Invalid blend node handle")]
    InvalidNodeHandle,

    /// Blend parameters must be finite numbers.
    #[error("Blend parameter must be finite, got {0}")]
    NonFiniteBlendParam(f32),

    /// Node 0 must be the only Base node.
    #[error("Blend tree node {position} cannot use mode {mode:?}: node 0 is Base, later nodes are Additive")]
    BaseNodeMisplaced {
        /// Position the node would have taken
        position: usize,
        /// Requested blend mode
        mode: crate::BlendMode,
    },

    /// Base nodes play absolute clips, additive nodes play diff clips.
    #[error("Blend mode {mode:?} cannot play this kind of clip")]
    ClipKindMismatch {
        /// Requested blend mode
        mode: crate::BlendMode,
    },
}

impl AnimationError {
    /// Returns `true` for errors that are recovered by skipping a clip track.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        self.data_error_joint().is_some()
    }

    /// The joint whose track a data error skips.
    #[must_use]
    pub fn data_error_joint(&self) -> Option<usize> {
        match self {
            Self::MissingJoint { joint, .. }
            | Self::EmptyTrack { joint, .. }
            | Self::UnsortedTrack { joint, .. }
            | Self::TrackLengthMismatch { joint, .. }
            | Self::TrackStartNotZero { joint, .. } => Some(*joint),
            _ => None,
        }
    }
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
