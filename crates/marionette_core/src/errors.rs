//! Error Types
//!
//! This module defines the error types used by the animation core.
//!
//! # Overview
//!
//! Errors are only produced while building immutable data (skeletons,
//! keyframe tracks). The per-frame pipeline never fails: invalid runtime
//! state degrades to the bind pose or to "no contribution".
//!
//! ```rust,ignore
//! use marionette_core::errors::Result;
//!
//! fn build() -> Result<Skeleton> {
//!     Skeleton::new("rig", bones)
//! }
//! ```

use thiserror::Error;

/// Construction-time failures of skeletons and keyframe data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// A bone lists a parent that does not come before it.
    ///
    /// Single-pass hierarchical evaluation requires every parent index to be
    /// strictly less than its child's index.
    #[error("Bone '{bone}' (index {index}) has parent {parent}, which does not precede it")]
    UnsortedHierarchy {
        /// Name of the offending bone
        bone: String,
        /// Index of the offending bone
        index: usize,
        /// The parent index it references
        parent: usize,
    },

    /// A bone references a parent index outside the bone list.
    #[error("Bone '{bone}' references parent {parent}, but the skeleton has {count} bones")]
    ParentOutOfRange {
        /// Name of the offending bone
        bone: String,
        /// The parent index it references
        parent: usize,
        /// Number of bones in the skeleton
        count: usize,
    },

    /// Parallel arrays passed to a constructor disagree in length.
    #[error("Length mismatch for {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Description of what was being built
        context: &'static str,
        /// The expected length
        expected: usize,
        /// The length actually provided
        actual: usize,
    },

    // ========================================================================
    // Keyframe Errors
    // ========================================================================
    /// Key times and key values have different lengths.
    #[error("Keyframe track has {times} times but {values} values")]
    KeyframeLengthMismatch {
        /// Number of key times
        times: usize,
        /// Number of key values
        values: usize,
    },

    /// Key times are not strictly increasing.
    #[error("Keyframe times must be strictly increasing (index {index}: {previous} -> {current})")]
    UnsortedKeyframes {
        /// Index of the first out-of-order key
        index: usize,
        /// Time of the preceding key
        previous: f32,
        /// Time of the out-of-order key
        current: f32,
    },
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
