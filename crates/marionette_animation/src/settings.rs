//! Animator configuration.
//!
//! ```rust,ignore
//! use marionette_animation::{AnimatorSettings, PoseEvaluator};
//!
//! let settings = AnimatorSettings {
//!     layer_count: 2,
//!     ..Default::default()
//! };
//! let animator = PoseEvaluator::with_settings(settings);
//! ```

use serde::{Deserialize, Serialize};

/// Construction-time settings of a [`PoseEvaluator`](crate::PoseEvaluator).
///
/// Every field has a default, so partial JSON configs deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorSettings {
    /// Abstract key of the bone that carries root motion, in addition to
    /// any parentless bone.
    pub root_bone_key: String,
    /// Layers created up front. At least one layer always exists.
    pub layer_count: usize,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            root_bone_key: "Hips".to_string(),
            layer_count: 1,
        }
    }
}
