#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Marionette: runtime skeletal animation.
//!
//! Umbrella crate re-exporting the workspace crates under stable paths.

pub mod skeleton {
    pub use marionette_core::*;
}

pub mod animation {
    pub use marionette_animation::*;
}

pub use marionette_animation::{
    AnimationClip, AnimationLayer, AnimatorSettings, Avatar, BoneTrack, Definition,
    KeyframeTrack, LayerBlendMode, LoopMode, Mask, PoseEvaluator, RootMotionDelta,
};
pub use marionette_core::{AnimationError, Bone, BoneMatrices, BoneTransform, MeshKind, Skeleton};
