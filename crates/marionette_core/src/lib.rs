//! Core data for the Marionette animation runtime.
//!
//! Immutable skeleton data shared by every animator instance, the TRS
//! helper used throughout pose evaluation, and the skinning output buffer
//! consumed by the renderer.

pub mod errors;
pub mod skeleton;
pub mod skinning;
pub mod transform;

pub use errors::{AnimationError, Result};
pub use skeleton::{Bone, Skeleton};
pub use skinning::{BoneMatrices, MeshKind};
pub use transform::BoneTransform;
