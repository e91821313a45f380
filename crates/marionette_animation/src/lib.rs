//! Layered skeletal animation.
//!
//! Clips are authored against abstract bone keys, retargeted onto a concrete
//! skeleton through an [`Avatar`], played on weighted [`AnimationLayer`]s with
//! cross-fades and masks, and composed by the [`PoseEvaluator`] into skinning
//! matrices.

mod values;
pub mod tracks;
pub mod clip;
pub mod playback;
pub mod mask;
pub mod avatar;
pub mod layer;
pub mod root_motion;
pub mod settings;
pub mod evaluator;

pub use avatar::{Avatar, BoneDefinition, Definition};
pub use clip::AnimationClip;
pub use evaluator::PoseEvaluator;
pub use layer::{AnimationLayer, LayerBlendMode, WEIGHT_EPSILON};
pub use mask::Mask;
pub use playback::{LoopMode, PlaybackState};
pub use root_motion::RootMotionDelta;
pub use settings::AnimatorSettings;
pub use tracks::{BoneTrack, InterpolationMode, KeyframeTrack};
pub use values::Interpolatable;
