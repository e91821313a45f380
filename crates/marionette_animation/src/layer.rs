use std::sync::Arc;

use marionette_core::BoneTransform;
use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;
use crate::mask::Mask;
use crate::playback::{LoopMode, PlaybackState};
use crate::root_motion::{self, RootMotionDelta};
use crate::tracks::BoneTrack;

/// Contributions at or below this weight are skipped.
pub const WEIGHT_EPSILON: f32 = 0.001;

/// How a layer combines with the pose accumulated by the layers before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerBlendMode {
    /// Moves the accumulated pose toward this layer's sample by
    /// `layer weight × mask weight`.
    #[default]
    Override,
    /// Reserved. Evaluated exactly like `Override`.
    Additive,
}

/// One playback slot of the animator.
///
/// Holds the current clip and, while a cross-fade runs, the clip being faded
/// out. Per-bone track and mask lookups are cached against the bone key table
/// handed over by the evaluator and only rebuilt when that table, the mask,
/// or a clip changes.
#[derive(Debug, Clone)]
pub struct AnimationLayer {
    weight: f32,
    blend_mode: LayerBlendMode,
    mask: Option<Arc<Mask>>,

    current: PlaybackState,
    previous: PlaybackState,
    transitioning: bool,
    transition_time: f32,
    transition_duration: f32,

    // Cursor of `current` before the last update, for root motion
    previous_frame_time: f32,
    root_motion_enabled: bool,
    root_motion_key: Arc<str>,

    // === Caches (bone index -> ...) ===
    bone_keys: Arc<[Option<Arc<str>>]>,
    current_tracks: Vec<Option<usize>>,
    previous_tracks: Vec<Option<usize>>,
    mask_weights: Vec<f32>,
}

impl Default for AnimationLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationLayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            weight: 1.0,
            blend_mode: LayerBlendMode::Override,
            mask: None,
            current: PlaybackState::new(),
            previous: PlaybackState::new(),
            transitioning: false,
            transition_time: 0.0,
            transition_duration: 0.0,
            previous_frame_time: 0.0,
            root_motion_enabled: false,
            root_motion_key: Arc::from("Hips"),
            bone_keys: Arc::from(Vec::<Option<Arc<str>>>::new()),
            current_tracks: Vec::new(),
            previous_tracks: Vec::new(),
            mask_weights: Vec::new(),
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Starts `clip`, cross-fading from the current clip over `blend_time`
    /// seconds when positive.
    ///
    /// Ignored when `clip` is `None`, or when it is already the current clip
    /// and no transition is running.
    pub fn play(
        &mut self,
        clip: Option<Arc<AnimationClip>>,
        blend_time: f32,
        mode: LoopMode,
        speed: f32,
    ) {
        let Some(clip) = clip else {
            return;
        };

        let already_current = self
            .current
            .clip()
            .is_some_and(|current| Arc::ptr_eq(current, &clip));
        if already_current && !self.transitioning {
            return;
        }

        if blend_time > 0.0 && self.current.is_valid() {
            std::mem::swap(&mut self.previous, &mut self.current);
            std::mem::swap(&mut self.previous_tracks, &mut self.current_tracks);
            self.transitioning = true;
            self.transition_time = 0.0;
            self.transition_duration = blend_time;
            log::trace!("Layer cross-fade to '{}' over {blend_time}s", clip.name);
        } else {
            self.transitioning = false;
            self.previous.invalidate();
            rebuild_track_cache(&mut self.previous_tracks, &self.bone_keys, None);
            log::trace!("Layer play '{}'", clip.name);
        }

        self.current.play(Some(clip), speed, mode);
        rebuild_track_cache(&mut self.current_tracks, &self.bone_keys, self.current.clip());
        self.previous_frame_time = self.current.time;
    }

    /// Drops both clips; the layer stops contributing.
    pub fn stop(&mut self) {
        self.current.invalidate();
        self.previous.invalidate();
        self.transitioning = false;
        rebuild_track_cache(&mut self.current_tracks, &self.bone_keys, None);
        rebuild_track_cache(&mut self.previous_tracks, &self.bone_keys, None);
    }

    /// Advances both playback states and the cross-fade timer.
    pub fn update(&mut self, dt: f32) {
        self.previous_frame_time = self.current.time;
        self.current.advance(dt);

        if !self.transitioning {
            self.current.weight = 1.0;
            return;
        }

        self.previous.advance(dt);
        self.transition_time += dt;

        let t = if self.transition_duration > 0.0 {
            (self.transition_time / self.transition_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.previous.weight = 1.0 - t;
        self.current.weight = t;

        if t >= 1.0 {
            self.transitioning = false;
            self.previous.invalidate();
            rebuild_track_cache(&mut self.previous_tracks, &self.bone_keys, None);
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Samples this layer for `bone` and blends it into `pose`.
    ///
    /// Returns `false` without touching `pose` when the effective weight is
    /// negligible or the current clip has no track for the bone.
    pub fn evaluate_and_blend(&self, bone: usize, mask_weight: f32, pose: &mut BoneTransform) -> bool {
        let final_alpha = self.weight * mask_weight;
        if self.weight <= WEIGHT_EPSILON
            || mask_weight <= WEIGHT_EPSILON
            || final_alpha <= WEIGHT_EPSILON
        {
            return false;
        }

        let Some(track) = self.current_track(bone) else {
            return false;
        };

        let mut sample = track.sample(self.current.time);
        if self.transitioning
            && let Some(previous_track) = self.previous_track(bone)
        {
            let faded = previous_track.sample(self.previous.time);
            sample = faded.blend(&sample, self.current.weight);
        }

        *pose = pose.blend(&sample, final_alpha);
        true
    }

    /// Root bone motion produced by the last [`update`](Self::update).
    #[must_use]
    pub fn root_motion_delta(&self) -> RootMotionDelta {
        if !self.root_motion_enabled {
            return RootMotionDelta::IDENTITY;
        }
        let Some(track) = self
            .current
            .clip()
            .and_then(|clip| clip.track(&self.root_motion_key))
        else {
            return RootMotionDelta::IDENTITY;
        };
        root_motion::extract(track, &self.current, self.previous_frame_time)
    }

    fn current_track(&self, bone: usize) -> Option<&BoneTrack> {
        let index = self.current_tracks.get(bone).copied().flatten()?;
        self.current.clip()?.track_at(index)
    }

    fn previous_track(&self, bone: usize) -> Option<&BoneTrack> {
        let index = self.previous_tracks.get(bone).copied().flatten()?;
        self.previous.clip()?.track_at(index)
    }

    // ========================================================================
    // Cache maintenance
    // ========================================================================

    /// Installs the evaluator's bone -> abstract key table and rebuilds every
    /// per-bone cache against it.
    pub fn bind_bone_keys(&mut self, bone_keys: Arc<[Option<Arc<str>>]>) {
        self.bone_keys = bone_keys;
        rebuild_track_cache(&mut self.current_tracks, &self.bone_keys, self.current.clip());
        rebuild_track_cache(&mut self.previous_tracks, &self.bone_keys, self.previous.clip());
        self.rebuild_mask_cache();
    }

    fn rebuild_mask_cache(&mut self) {
        let mask = self.mask.as_deref();
        self.mask_weights.clear();
        self.mask_weights
            .extend(self.bone_keys.iter().map(|key| match (mask, key) {
                (None, _) => 1.0,
                (Some(mask), Some(key)) => mask.weight(key),
                (Some(_), None) => 0.0,
            }));
    }

    /// Cached mask weight of `bone`: 1.0 everywhere without a mask, the
    /// mask's weight (0 for unlisted keys) with one.
    #[inline]
    #[must_use]
    pub fn mask_weight(&self, bone: usize) -> f32 {
        match self.mask_weights.get(bone) {
            Some(&weight) => weight,
            None if self.mask.is_none() => 1.0,
            None => 0.0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(0.0, 1.0);
    }

    #[inline]
    #[must_use]
    pub fn mask(&self) -> Option<&Arc<Mask>> {
        self.mask.as_ref()
    }

    pub fn set_mask(&mut self, mask: Option<Arc<Mask>>) {
        self.mask = mask;
        self.rebuild_mask_cache();
    }

    #[inline]
    #[must_use]
    pub fn blend_mode(&self) -> LayerBlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, mode: LayerBlendMode) {
        if mode == LayerBlendMode::Additive {
            log::warn!("Additive layer blending is reserved; layer will blend as Override");
        }
        self.blend_mode = mode;
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.current.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.current.speed = speed;
    }

    #[inline]
    #[must_use]
    pub fn loop_mode(&self) -> LoopMode {
        self.current.mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.current.set_mode(mode);
    }

    #[inline]
    #[must_use]
    pub fn current_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.current.clip()
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &PlaybackState {
        &self.current
    }

    #[inline]
    #[must_use]
    pub fn previous(&self) -> &PlaybackState {
        &self.previous
    }

    #[inline]
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        self.current.normalized_time()
    }

    #[inline]
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Progress of the running cross-fade in [0, 1]; 0 when none runs.
    #[must_use]
    pub fn transition_progress(&self) -> f32 {
        if self.transitioning {
            self.current.weight
        } else {
            0.0
        }
    }

    #[inline]
    #[must_use]
    pub fn root_motion_enabled(&self) -> bool {
        self.root_motion_enabled
    }

    pub fn set_root_motion_enabled(&mut self, enabled: bool) {
        self.root_motion_enabled = enabled;
    }

    #[inline]
    #[must_use]
    pub fn root_motion_key(&self) -> &str {
        &self.root_motion_key
    }

    pub fn set_root_motion_key(&mut self, key: impl Into<Arc<str>>) {
        self.root_motion_key = key.into();
    }
}

fn rebuild_track_cache(
    cache: &mut Vec<Option<usize>>,
    bone_keys: &[Option<Arc<str>>],
    clip: Option<&Arc<AnimationClip>>,
) {
    cache.clear();
    cache.extend(bone_keys.iter().map(|key| {
        let key = key.as_deref()?;
        clip?.track_index(key)
    }));
}
