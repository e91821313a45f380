//! Pose Evaluator
//!
//! Owns the layer stack of one animated character and turns it into skinning
//! matrices every frame.
//!
//! # Per-frame pipeline
//!
//! 1. Every layer advances its playback states and cross-fade timer.
//! 2. Bones are visited in skeleton order (parents first). Mapped bones start
//!    from identity rotation/scale and their bind translation; each layer
//!    blends its sample in with `layer weight × mask weight`. Only root-motion
//!    bones take translation from animation, so bone lengths stay those of
//!    the bind pose.
//! 3. A mapped bone composes against its *logical* parent: the nearest
//!    ancestor that is mapped as well. Structural bones the clip knows nothing
//!    about therefore cannot distort the animated chain.
//! 4. An unmapped bone keeps its bind-local transform and composes against
//!    its *structural* parent.
//! 5. `skinning = global × inverse_bind` is written to the output buffer.
//!
//! All per-bone lookup tables are built when the skeleton or avatar changes;
//! `update` performs no allocation.

use std::sync::Arc;

use glam::{Affine3A, Mat4, Quat, Vec3};
use marionette_core::{BoneMatrices, BoneTransform, Skeleton};
use smallvec::SmallVec;

use crate::avatar::Avatar;
use crate::clip::AnimationClip;
use crate::layer::{AnimationLayer, LayerBlendMode, WEIGHT_EPSILON};
use crate::mask::Mask;
use crate::playback::LoopMode;
use crate::root_motion::RootMotionDelta;
use crate::settings::AnimatorSettings;

pub struct PoseEvaluator {
    settings: AnimatorSettings,
    skeleton: Option<Arc<Skeleton>>,
    avatar: Option<Arc<Avatar>>,
    layers: SmallVec<[AnimationLayer; 4]>,
    paused: bool,

    // === Per-bone tables (rebuilt on binding) ===
    bone_keys: Arc<[Option<Arc<str>>]>,
    root_motion_bones: Vec<bool>,
    logical_parents: Vec<Option<usize>>,

    // === Output ===
    globals: Vec<Affine3A>,
    bone_matrices: BoneMatrices,
}

impl Default for PoseEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(AnimatorSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: AnimatorSettings) -> Self {
        let mut evaluator = Self {
            settings,
            skeleton: None,
            avatar: None,
            layers: SmallVec::new(),
            paused: false,
            bone_keys: Arc::from(Vec::<Option<Arc<str>>>::new()),
            root_motion_bones: Vec::new(),
            logical_parents: Vec::new(),
            globals: Vec::new(),
            bone_matrices: BoneMatrices::default(),
        };
        for _ in 0..evaluator.settings.layer_count.max(1) {
            evaluator.add_layer();
        }
        evaluator
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AnimatorSettings {
        &self.settings
    }

    // ========================================================================
    // Binding
    // ========================================================================

    pub fn set_skeleton(&mut self, skeleton: Option<Arc<Skeleton>>) {
        self.skeleton = skeleton;
        self.rebuild_bone_tables();
    }

    pub fn set_avatar(&mut self, avatar: Option<Arc<Avatar>>) {
        self.avatar = avatar;
        self.rebuild_bone_tables();
    }

    /// Binds skeleton and avatar together, rebuilding the tables once.
    pub fn bind(&mut self, skeleton: Arc<Skeleton>, avatar: Arc<Avatar>) {
        self.skeleton = Some(skeleton);
        self.avatar = Some(avatar);
        self.rebuild_bone_tables();
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> Option<&Arc<Skeleton>> {
        self.skeleton.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn avatar(&self) -> Option<&Arc<Avatar>> {
        self.avatar.as_ref()
    }

    /// Skeleton and avatar are both bound. Until then `update` does nothing
    /// and the output buffer must not be used for skinning.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.skeleton.is_some() && self.avatar.is_some()
    }

    fn rebuild_bone_tables(&mut self) {
        let Some(skeleton) = &self.skeleton else {
            self.bone_keys = Arc::from(Vec::<Option<Arc<str>>>::new());
            self.root_motion_bones.clear();
            self.logical_parents.clear();
            self.globals.clear();
            self.bone_matrices.resize(0);
            self.push_bone_keys();
            return;
        };

        let keys = match &self.avatar {
            Some(avatar) => avatar.bone_keys(skeleton),
            None => vec![None; skeleton.len()],
        };

        let root_key = self.settings.root_bone_key.as_str();
        self.root_motion_bones.clear();
        self.root_motion_bones.extend(
            skeleton
                .bones()
                .iter()
                .zip(&keys)
                .map(|(bone, key)| bone.parent.is_none() || key.as_deref() == Some(root_key)),
        );

        self.logical_parents.clear();
        self.logical_parents
            .extend((0..skeleton.len()).map(|i| find_logical_parent(skeleton, &keys, i)));

        self.globals.clear();
        self.globals.extend(skeleton.bind_globals());
        self.bone_matrices.resize(skeleton.len());

        log::debug!(
            "PoseEvaluator bound to '{}': {} bones, {} mapped",
            skeleton.name,
            skeleton.len(),
            keys.iter().filter(|k| k.is_some()).count()
        );

        self.bone_keys = Arc::from(keys);
        self.push_bone_keys();
    }

    fn push_bone_keys(&mut self) {
        for layer in &mut self.layers {
            layer.bind_bone_keys(self.bone_keys.clone());
        }
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advances all layers by `dt` seconds and recomputes the skinning
    /// matrices. No-op while not ready or paused.
    pub fn update(&mut self, dt: f32) {
        if self.paused || !self.is_ready() {
            return;
        }
        let Some(skeleton) = &self.skeleton else {
            return;
        };

        for layer in &mut self.layers {
            layer.update(dt);
        }

        for (i, bone) in skeleton.bones().iter().enumerate() {
            let global = if self.bone_keys[i].is_some() {
                let bind = bone.bind_pose();
                let mut pose = BoneTransform {
                    translation: bind.translation,
                    rotation: Quat::IDENTITY,
                    scale: Vec3::ONE,
                };
                let drives_root = self.root_motion_bones[i];

                for layer in &self.layers {
                    let mask_weight = layer.mask_weight(i);
                    if layer.weight() * mask_weight <= WEIGHT_EPSILON {
                        continue;
                    }
                    if drives_root {
                        layer.evaluate_and_blend(i, mask_weight, &mut pose);
                    } else {
                        // Translation stays at bind value for non-root bones
                        let mut scratch = pose;
                        if layer.evaluate_and_blend(i, mask_weight, &mut scratch) {
                            pose.rotation = scratch.rotation;
                            pose.scale = scratch.scale;
                        }
                    }
                }

                let parent_global = self.logical_parents[i]
                    .map_or(Affine3A::IDENTITY, |parent| self.globals[parent]);
                parent_global * pose.to_affine()
            } else {
                let parent_global = bone
                    .parent
                    .map_or(Affine3A::IDENTITY, |parent| self.globals[parent]);
                parent_global * bone.bind_local
            };
            self.globals[i] = global;
        }

        let matrices = self.bone_matrices.write();
        for ((out, global), bone) in matrices.iter_mut().zip(&self.globals).zip(skeleton.bones()) {
            *out = Mat4::from(*global * bone.inverse_bind);
        }
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Skinning matrices, one per bone, in column-major GPU layout.
    #[inline]
    #[must_use]
    pub fn bone_matrices(&self) -> &BoneMatrices {
        &self.bone_matrices
    }

    /// Model-space transform of every bone from the last update.
    #[inline]
    #[must_use]
    pub fn global_transforms(&self) -> &[Affine3A] {
        &self.globals
    }

    #[inline]
    #[must_use]
    pub fn bone_key(&self, bone: usize) -> Option<&str> {
        self.bone_keys.get(bone)?.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn logical_parent(&self, bone: usize) -> Option<usize> {
        self.logical_parents.get(bone).copied().flatten()
    }

    #[inline]
    #[must_use]
    pub fn is_root_motion_bone(&self, bone: usize) -> bool {
        self.root_motion_bones.get(bone).copied().unwrap_or(false)
    }

    /// Root motion of the last update, folded over root-motion layers in
    /// list order with override blending by layer weight.
    #[must_use]
    pub fn root_motion_delta(&self) -> RootMotionDelta {
        self.layers
            .iter()
            .filter(|layer| layer.root_motion_enabled() && layer.weight() > WEIGHT_EPSILON)
            .fold(RootMotionDelta::IDENTITY, |acc, layer| {
                acc.blend(&layer.root_motion_delta(), layer.weight())
            })
    }

    // ========================================================================
    // Layer stack
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Appends a full-weight, unmasked layer and returns its index.
    pub fn add_layer(&mut self) -> usize {
        let mut layer = AnimationLayer::new();
        layer.set_root_motion_key(self.settings.root_bone_key.as_str());
        layer.bind_bone_keys(self.bone_keys.clone());
        self.layers.push(layer);
        self.layers.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&AnimationLayer> {
        self.layers.get(index)
    }

    #[inline]
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut AnimationLayer> {
        self.layers.get_mut(index)
    }

    // ========================================================================
    // Control surface (out-of-range layer indices are ignored)
    // ========================================================================

    pub fn play(
        &mut self,
        layer: usize,
        clip: Option<Arc<AnimationClip>>,
        blend_time: f32,
        mode: LoopMode,
        speed: f32,
    ) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.play(clip, blend_time, mode, speed);
        }
    }

    pub fn stop(&mut self, layer: usize) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.stop();
        }
    }

    /// Layer weight, 0 for an unknown layer.
    #[must_use]
    pub fn layer_weight(&self, layer: usize) -> f32 {
        self.layers.get(layer).map_or(0.0, AnimationLayer::weight)
    }

    pub fn set_layer_weight(&mut self, layer: usize, weight: f32) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_weight(weight);
        }
    }

    #[must_use]
    pub fn layer_mask(&self, layer: usize) -> Option<&Arc<Mask>> {
        self.layers.get(layer)?.mask()
    }

    pub fn set_layer_mask(&mut self, layer: usize, mask: Option<Arc<Mask>>) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_mask(mask);
        }
    }

    /// Playback speed, 1 for an unknown layer.
    #[must_use]
    pub fn layer_speed(&self, layer: usize) -> f32 {
        self.layers.get(layer).map_or(1.0, AnimationLayer::speed)
    }

    pub fn set_layer_speed(&mut self, layer: usize, speed: f32) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_speed(speed);
        }
    }

    /// Loop mode, `Loop` for an unknown layer.
    #[must_use]
    pub fn layer_loop_mode(&self, layer: usize) -> LoopMode {
        self.layers
            .get(layer)
            .map_or(LoopMode::Loop, AnimationLayer::loop_mode)
    }

    pub fn set_layer_loop_mode(&mut self, layer: usize, mode: LoopMode) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_loop_mode(mode);
        }
    }

    /// Blend mode, `Override` for an unknown layer.
    #[must_use]
    pub fn layer_blend_mode(&self, layer: usize) -> LayerBlendMode {
        self.layers
            .get(layer)
            .map_or(LayerBlendMode::Override, AnimationLayer::blend_mode)
    }

    pub fn set_layer_blend_mode(&mut self, layer: usize, mode: LayerBlendMode) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_blend_mode(mode);
        }
    }

    pub fn set_root_motion_enabled(&mut self, layer: usize, enabled: bool) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_root_motion_enabled(enabled);
        }
    }

    /// Current clip position in [0, 1], 0 for an unknown layer.
    #[must_use]
    pub fn normalized_time(&self, layer: usize) -> f32 {
        self.layers
            .get(layer)
            .map_or(0.0, AnimationLayer::normalized_time)
    }

    /// Cross-fade progress in [0, 1], 0 for an unknown layer or when no
    /// cross-fade runs.
    #[must_use]
    pub fn transition_progress(&self, layer: usize) -> f32 {
        self.layers
            .get(layer)
            .map_or(0.0, AnimationLayer::transition_progress)
    }

    #[must_use]
    pub fn current_clip(&self, layer: usize) -> Option<&Arc<AnimationClip>> {
        self.layers.get(layer)?.current_clip()
    }

    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// Nearest ancestor of `bone` that carries an abstract key.
fn find_logical_parent(
    skeleton: &Skeleton,
    keys: &[Option<Arc<str>>],
    bone: usize,
) -> Option<usize> {
    let mut parent = skeleton.parent_of(bone);
    while let Some(index) = parent {
        if keys[index].is_some() {
            return Some(index);
        }
        parent = skeleton.parent_of(index);
    }
    None
}
